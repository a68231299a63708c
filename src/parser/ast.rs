//! Token records produced by the marker and block passes
//!
//! Both passes replace the markup they consume with a `{_<id>}` placeholder
//! and record what the placeholder stands for in a [`TokenTable`]. A table
//! belongs to exactly one render call.

use std::collections::HashMap;

/// Structured form of a control block
///
/// Bodies are flattened text: nested blocks and markers inside them have
/// already been replaced by placeholders.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    If {
        cond: String,
        then_body: String,
        else_body: Option<String>,
    },
    For {
        key: Option<String>,
        elem: String,
        list: String,
        body: String,
        else_body: Option<String>,
    },
    /// Inline assignment: `{% set name = value %}`
    Set { name: String, value: String },
    /// Body assignment: `{% set name %}...{% endset %}`
    SetBlock { name: String, body: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A `{{ expr | filter... }}` marker
    Variable {
        buffer: String,
        filters: Vec<String>,
    },
    /// A complete control block; `buffer` holds its markup from the opening
    /// tag through the terminator
    Directive {
        buffer: String,
        directive: Directive,
    },
    /// Markup emitted verbatim, such as the opening tag of a block that
    /// never closes
    Literal { buffer: String },
}

/// Per-render mapping from placeholder id to token
#[derive(Debug)]
pub struct TokenTable {
    tokens: HashMap<usize, Token>,
    next_id: usize,
}

impl Default for TokenTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenTable {
    pub fn new() -> Self {
        Self {
            tokens: HashMap::new(),
            next_id: 1,
        }
    }

    /// Record a token under a fresh id and return the id
    pub fn insert(&mut self, token: Token) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.tokens.insert(id, token);
        id
    }

    pub fn get(&self, id: usize) -> Option<&Token> {
        self.tokens.get(&id)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The text a token with this id is replaced by
    pub fn placeholder(id: usize) -> String {
        format!("{{_{}}}", id)
    }
}

/// Find the next `{_<digits>}` placeholder at or after `from`
///
/// Returns `(start, end, id)` with `end` exclusive.
pub fn find_placeholder(text: &str, from: usize) -> Option<(usize, usize, usize)> {
    let mut cursor = from;
    while let Some(offset) = text[cursor..].find("{_") {
        let start = cursor + offset;
        let digits_start = start + 2;
        let digits = text[digits_start..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        let close = digits_start + digits;
        if digits > 0 && text[close..].starts_with('}') {
            if let Ok(id) = text[digits_start..close].parse() {
                return Some((start, close + 1, id));
            }
        }
        cursor = digits_start;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let mut table = TokenTable::new();
        let token = Token::Variable {
            buffer: "a".to_string(),
            filters: vec![],
        };
        assert_eq!(table.insert(token.clone()), 1);
        assert_eq!(table.insert(token), 2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_placeholder_format() {
        assert_eq!(TokenTable::placeholder(12), "{_12}");
    }

    #[test]
    fn test_find_placeholder_skips_lookalikes() {
        let text = "a {_} b {_x} c {_42} d";
        assert_eq!(find_placeholder(text, 0), Some((15, 20, 42)));
        assert_eq!(find_placeholder(text, 20), None);
    }

    #[test]
    fn test_find_placeholder_from_offset() {
        let text = "{_1}{_2}";
        assert_eq!(find_placeholder(text, 0), Some((0, 4, 1)));
        assert_eq!(find_placeholder(text, 4), Some((4, 8, 2)));
    }
}
