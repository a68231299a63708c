//! Block pass: folds `{% ... %}` control blocks into directive placeholders
//!
//! Scanning is recursive descent over the flattened text. An opening tag
//! starts a nested scan that looks for its own terminator; any block opened
//! inside it is folded first, so by the time a terminator is found every
//! inner block is already a single placeholder.

use std::ops::Range;

use super::ast::{find_placeholder, Directive, Token, TokenTable};
use super::lexer::{parse_tag, Tag};

/// Block waiting for its terminator
#[derive(Debug)]
struct Pending {
    kind: BlockKind,
    /// Start of the opening tag
    open_start: usize,
    /// End of the opening tag, where the body starts
    body_start: usize,
    /// The `else` tag at this nesting level, if one was seen
    else_tag: Option<Range<usize>>,
}

#[derive(Debug)]
enum BlockKind {
    If {
        cond: String,
    },
    For {
        key: Option<String>,
        elem: String,
        list: String,
    },
    SetBlock {
        name: String,
    },
}

impl Pending {
    fn closed_by(&self, tag: &Tag) -> bool {
        matches!(
            (&self.kind, tag),
            (BlockKind::If { .. }, Tag::EndIf)
                | (BlockKind::For { .. }, Tag::EndFor)
                | (BlockKind::SetBlock { .. }, Tag::EndSet)
        )
    }

    fn takes_else(&self) -> bool {
        self.else_tag.is_none() && !matches!(self.kind, BlockKind::SetBlock { .. })
    }
}

/// Replace every complete control block in `text` with a placeholder
pub fn extract_controls(text: String, table: &mut TokenTable) -> String {
    Structurer { table }.scan(text, 0, None).0
}

struct Structurer<'a> {
    table: &'a mut TokenTable,
}

impl Structurer<'_> {
    /// Scan from `cursor`, closing `pending` if its terminator shows up
    ///
    /// Returns the rewritten text and the offset the caller should resume at.
    fn scan(
        &mut self,
        mut text: String,
        mut cursor: usize,
        mut pending: Option<Pending>,
    ) -> (String, usize) {
        while let Some(span) = find_tag(&text, cursor) {
            let tag = parse_tag(&text[span.start + 2..span.end - 2]);

            if pending.as_ref().is_some_and(|p| p.closed_by(&tag)) {
                if let Some(block) = pending.take() {
                    return self.close(text, block, span);
                }
            }

            if tag == Tag::Else {
                if let Some(block) = pending.as_mut().filter(|p| p.takes_else()) {
                    block.else_tag = Some(span.clone());
                    cursor = span.end;
                    continue;
                }
            }

            let kind = match tag {
                Tag::For { key, elem, list } => BlockKind::For { key, elem, list },
                Tag::If { cond } => BlockKind::If { cond },
                Tag::SetBlock { name } => BlockKind::SetBlock { name },
                Tag::Set { name, value } => {
                    let buffer = text[span.clone()].to_string();
                    let placeholder = self.record(buffer, Directive::Set { name, value });
                    text.replace_range(span.clone(), &placeholder);
                    cursor = span.start + placeholder.len();
                    continue;
                }
                _ => {
                    cursor = span.end;
                    continue;
                }
            };

            let block = Pending {
                kind,
                open_start: span.start,
                body_start: span.end,
                else_tag: None,
            };
            (text, cursor) = self.scan(text, span.end, Some(block));
        }

        match pending {
            Some(block) => {
                tracing::warn!(
                    position = block.open_start,
                    "unterminated block left as text"
                );
                // A folded opener is a placeholder, so enclosing scans never reopen it
                let span = block.open_start..block.body_start;
                let buffer = text[span.clone()].to_string();
                let id = self.table.insert(Token::Literal { buffer });
                let placeholder = TokenTable::placeholder(id);
                text.replace_range(span, &placeholder);
                let resume = block.open_start + placeholder.len();
                (text, resume)
            }
            None => {
                let end = text.len();
                (text, end)
            }
        }
    }

    fn close(&mut self, mut text: String, block: Pending, close: Range<usize>) -> (String, usize) {
        let (body_end, else_body) = match &block.else_tag {
            Some(tag) => (tag.start, Some(text[tag.end..close.start].to_string())),
            None => (close.start, None),
        };
        let body = text[block.body_start..body_end].to_string();

        let directive = match block.kind {
            BlockKind::If { cond } => Directive::If {
                cond,
                then_body: body,
                else_body,
            },
            BlockKind::For { key, elem, list } => Directive::For {
                key,
                elem,
                list,
                body,
                else_body,
            },
            BlockKind::SetBlock { name } => Directive::SetBlock {
                name,
                body: self.strip_literals(&strip_tags(&body)),
            },
        };

        let span = block.open_start..close.end;
        let buffer = text[span.clone()].to_string();
        let placeholder = self.record(buffer, directive);
        text.replace_range(span, &placeholder);
        let resume = block.open_start + placeholder.len();
        (text, resume)
    }

    /// Drop placeholders of literal tags, which `strip_tags` would have removed
    fn strip_literals(&self, body: &str) -> String {
        let mut out = String::with_capacity(body.len());
        let mut cursor = 0;
        while let Some((start, end, id)) = find_placeholder(body, cursor) {
            let keep = !matches!(self.table.get(id), Some(Token::Literal { .. }));
            out.push_str(&body[cursor..if keep { end } else { start }]);
            cursor = end;
        }
        out.push_str(&body[cursor..]);
        out
    }

    fn record(&mut self, buffer: String, directive: Directive) -> String {
        let id = self.table.insert(Token::Directive { buffer, directive });
        TokenTable::placeholder(id)
    }
}

/// Locate the next complete `{% ... %}` tag at or after `from`
fn find_tag(text: &str, from: usize) -> Option<Range<usize>> {
    let start = from + text[from..].find("{%")?;
    let close = text[start + 2..].find("%}")?;
    Some(start..start + 2 + close + 2)
}

/// Remove every remaining `{% ... %}` tag from a block body
fn strip_tags(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut cursor = 0;
    while let Some(span) = find_tag(body, cursor) {
        out.push_str(&body[cursor..span.start]);
        cursor = span.end;
    }
    out.push_str(&body[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn directive(table: &TokenTable, id: usize) -> (&str, &Directive) {
        match table.get(id) {
            Some(Token::Directive { buffer, directive }) => (buffer.as_str(), directive),
            other => panic!("Expected directive token, got {:?}", other),
        }
    }

    #[test]
    fn test_if_else_block() {
        let mut table = TokenTable::new();
        let out = extract_controls("a{% if x %}Y{% else %}N{% endif %}b".to_string(), &mut table);
        assert_eq!(out, "a{_1}b");

        let (buffer, dir) = directive(&table, 1);
        assert_eq!(buffer, "{% if x %}Y{% else %}N{% endif %}");
        assert_eq!(
            dir,
            &Directive::If {
                cond: "x".to_string(),
                then_body: "Y".to_string(),
                else_body: Some("N".to_string()),
            }
        );
    }

    #[test]
    fn test_nested_blocks_fold_innermost_first() {
        let mut table = TokenTable::new();
        let out = extract_controls(
            "{% for a in as %}[{% for b in bs %}{% if b %}x{% endif %}{% endfor %}]{% endfor %}"
                .to_string(),
            &mut table,
        );
        assert_eq!(out, "{_3}");

        // ids are assigned as blocks close: the innermost if first
        assert!(matches!(directive(&table, 1).1, Directive::If { .. }));
        match directive(&table, 2).1 {
            Directive::For { elem, body, .. } => {
                assert_eq!(elem, "b");
                assert_eq!(body, "{_1}");
            }
            other => panic!("Expected For, got {:?}", other),
        }
        match directive(&table, 3).1 {
            Directive::For { elem, body, .. } => {
                assert_eq!(elem, "a");
                assert_eq!(body, "[{_2}]");
            }
            other => panic!("Expected For, got {:?}", other),
        }
    }

    #[test]
    fn test_inner_else_belongs_to_inner_block() {
        let mut table = TokenTable::new();
        extract_controls(
            "{% for x in xs %}{% if x %}a{% else %}b{% endif %}{% else %}none{% endfor %}"
                .to_string(),
            &mut table,
        );
        match directive(&table, 2).1 {
            Directive::For { body, else_body, .. } => {
                assert_eq!(body, "{_1}");
                assert_eq!(else_body.as_deref(), Some("none"));
            }
            other => panic!("Expected For, got {:?}", other),
        }
    }

    #[test]
    fn test_inline_set_is_its_own_block() {
        let mut table = TokenTable::new();
        let out = extract_controls("{% set a = b.c %}after".to_string(), &mut table);
        assert_eq!(out, "{_1}after");
        assert_eq!(
            directive(&table, 1).1,
            &Directive::Set {
                name: "a".to_string(),
                value: "b.c".to_string()
            }
        );
    }

    #[test]
    fn test_set_block_strips_stray_tags() {
        let mut table = TokenTable::new();
        extract_controls(
            "{% set body %}one{% else %}two{% endset %}".to_string(),
            &mut table,
        );
        assert_eq!(
            directive(&table, 1).1,
            &Directive::SetBlock {
                name: "body".to_string(),
                body: "onetwo".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_tags_are_literal() {
        let mut table = TokenTable::new();
        let out = extract_controls("{% include 'x' %} {% endif %}".to_string(), &mut table);
        assert_eq!(out, "{% include 'x' %} {% endif %}");
        assert!(table.is_empty());
    }

    #[test]
    fn test_unterminated_block_is_literal() {
        let mut table = TokenTable::new();
        let out = extract_controls(
            "{% if a %}open {% if b %}B{% endif %}".to_string(),
            &mut table,
        );
        assert_eq!(out, "{_2}open {_1}");
        assert_eq!(
            table.get(2),
            Some(&Token::Literal {
                buffer: "{% if a %}".to_string()
            })
        );
    }

    #[test]
    fn test_many_unterminated_openers_fold_once_each() {
        let mut table = TokenTable::new();
        let out = extract_controls("{% if a %}x".repeat(40), &mut table);
        assert_eq!(table.len(), 40);
        // innermost opener closes its scan first
        assert!(out.starts_with("{_40}x{_39}x"));
        assert!(out.ends_with("{_1}x"));
    }

    #[test]
    fn test_first_else_wins() {
        let mut table = TokenTable::new();
        extract_controls(
            "{% if a %}A{% else %}B{% else %}C{% endif %}".to_string(),
            &mut table,
        );
        assert_eq!(
            directive(&table, 1).1,
            &Directive::If {
                cond: "a".to_string(),
                then_body: "A".to_string(),
                else_body: Some("B{% else %}C".to_string()),
            }
        );
    }

    #[test]
    fn test_set_block_drops_unterminated_openers() {
        let mut table = TokenTable::new();
        extract_controls("{% set s %}{% if a %}y{% endset %}".to_string(), &mut table);
        assert_eq!(
            directive(&table, 2).1,
            &Directive::SetBlock {
                name: "s".to_string(),
                body: "y".to_string()
            }
        );
    }

    #[test]
    fn test_terminators_ignore_case() {
        let mut table = TokenTable::new();
        let out = extract_controls("{% IF a %}x{% EndIf %}".to_string(), &mut table);
        assert_eq!(out, "{_1}");
    }
}
