//! Marker pass: replaces every `{{ ... }}` span with a placeholder

use super::ast::{Token, TokenTable};

/// Replace each `{{ expr | filter... }}` marker with a placeholder
///
/// The template is trimmed first. Markers do not nest: a marker ends at the
/// first `}}` after its opening delimiter.
pub fn extract_markers(template: &str, table: &mut TokenTable) -> String {
    let mut text = template.trim().to_string();
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find("{{") {
        let start = cursor + offset;
        let Some(close) = text[start + 2..].find("}}") else {
            tracing::warn!(position = start, "unterminated marker left as text");
            break;
        };
        let end = start + 2 + close + 2;

        let mut parts = split_pipes(text[start + 2..end - 2].trim()).into_iter();
        let buffer = parts.next().unwrap_or_default();
        let filters: Vec<String> = parts.collect();

        let id = table.insert(Token::Variable { buffer, filters });
        let placeholder = TokenTable::placeholder(id);
        text.replace_range(start..end, &placeholder);
        cursor = start + placeholder.len();
    }

    text
}

/// Split marker content on `|`, ignoring pipes inside quoted literals
fn split_pipes(content: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in content.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '|' => parts.push(std::mem::take(&mut current).trim().to_string()),
                '"' | '\'' => {
                    quote = Some(c);
                    current.push(c);
                }
                _ => current.push(c),
            },
        }
    }
    parts.push(current.trim().to_string());
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn variable(table: &TokenTable, id: usize) -> (String, Vec<String>) {
        match table.get(id) {
            Some(Token::Variable { buffer, filters }) => (buffer.clone(), filters.clone()),
            other => panic!("Expected variable token, got {:?}", other),
        }
    }

    #[test]
    fn test_markers_become_placeholders() {
        let mut table = TokenTable::new();
        let out = extract_markers("  Hello {{ name }}, {{ greeting }}!  ", &mut table);
        assert_eq!(out, "Hello {_1}, {_2}!");
        assert_eq!(variable(&table, 1), ("name".to_string(), vec![]));
        assert_eq!(variable(&table, 2), ("greeting".to_string(), vec![]));
    }

    #[test]
    fn test_filters_are_split_and_trimmed() {
        let mut table = TokenTable::new();
        extract_markers("{{ title | lower | truncate(10) }}", &mut table);
        assert_eq!(
            variable(&table, 1),
            (
                "title".to_string(),
                vec!["lower".to_string(), "truncate(10)".to_string()]
            )
        );
    }

    #[test]
    fn test_pipe_inside_quotes_is_kept() {
        let mut table = TokenTable::new();
        extract_markers(r#"{{ tags | join(" | ") }}"#, &mut table);
        assert_eq!(
            variable(&table, 1),
            ("tags".to_string(), vec![r#"join(" | ")"#.to_string()])
        );
    }

    #[test]
    fn test_unterminated_marker_is_left_alone() {
        let mut table = TokenTable::new();
        let out = extract_markers("{{ a }} and {{ b", &mut table);
        assert_eq!(out, "{_1} and {{ b");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_tags_are_untouched() {
        let mut table = TokenTable::new();
        let out = extract_markers("{% if a %}{{ a }}{% endif %}", &mut table);
        assert_eq!(out, "{% if a %}{_1}{% endif %}");
    }
}
