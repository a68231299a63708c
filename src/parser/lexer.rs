//! Lexers for directive tag contents and filter argument lists, using logos

use logos::{Lexer, Logos};

/// Tokens inside a `{% ... %}` tag
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum TagToken {
    // Keywords are case-insensitive
    #[token("for", ignore(ascii_case))]
    For,
    #[token("in", ignore(ascii_case))]
    In,
    #[token("if", ignore(ascii_case))]
    If,
    #[token("set", ignore(ascii_case))]
    Set,
    #[token("else", ignore(ascii_case))]
    Else,
    #[token("endfor", ignore(ascii_case))]
    EndFor,
    #[token("endif", ignore(ascii_case))]
    EndIf,
    #[token("endset", ignore(ascii_case))]
    EndSet,

    #[token(",")]
    Comma,
    #[token("=")]
    Equals,

    // Identifiers must come after keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),
}

/// A classified directive tag
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    /// `for [key,] elem in list`
    For {
        key: Option<String>,
        elem: String,
        list: String,
    },
    /// `if cond`
    If { cond: String },
    /// `set name = value`
    Set { name: String, value: String },
    /// `set name` opening a body that ends at `endset`
    SetBlock { name: String },
    Else,
    EndFor,
    EndIf,
    EndSet,
    /// Anything else; left in the output as literal text
    Unknown,
}

/// Classify the content between `{%` and `%}`
///
/// Expressions (the condition, the loop source and the assigned value) are
/// taken verbatim from the rest of the tag and trimmed.
pub fn parse_tag(content: &str) -> Tag {
    let mut lex = TagToken::lexer(content);
    match lex.next() {
        Some(Ok(TagToken::For)) => parse_for(&mut lex),
        Some(Ok(TagToken::If)) => match rest(&lex) {
            Some(cond) => Tag::If { cond },
            None => Tag::Unknown,
        },
        Some(Ok(TagToken::Set)) => parse_set(&mut lex),
        Some(Ok(TagToken::Else)) => standalone(lex, Tag::Else),
        Some(Ok(TagToken::EndFor)) => standalone(lex, Tag::EndFor),
        Some(Ok(TagToken::EndIf)) => standalone(lex, Tag::EndIf),
        Some(Ok(TagToken::EndSet)) => standalone(lex, Tag::EndSet),
        _ => Tag::Unknown,
    }
}

fn parse_for(lex: &mut Lexer<'_, TagToken>) -> Tag {
    let Some(Ok(TagToken::Ident(first))) = lex.next() else {
        return Tag::Unknown;
    };

    let (key, elem) = match lex.next() {
        Some(Ok(TagToken::In)) => (None, first),
        Some(Ok(TagToken::Comma)) => {
            let Some(Ok(TagToken::Ident(second))) = lex.next() else {
                return Tag::Unknown;
            };
            if lex.next() != Some(Ok(TagToken::In)) {
                return Tag::Unknown;
            }
            (Some(first), second)
        }
        _ => return Tag::Unknown,
    };

    match rest(lex) {
        Some(list) => Tag::For { key, elem, list },
        None => Tag::Unknown,
    }
}

fn parse_set(lex: &mut Lexer<'_, TagToken>) -> Tag {
    let Some(Ok(TagToken::Ident(name))) = lex.next() else {
        return Tag::Unknown;
    };

    match lex.next() {
        None => Tag::SetBlock { name },
        // `set name =` with nothing after it opens a body as well
        Some(Ok(TagToken::Equals)) => match rest(lex) {
            Some(value) => Tag::Set { name, value },
            None => Tag::SetBlock { name },
        },
        _ => Tag::Unknown,
    }
}

fn standalone(mut lex: Lexer<'_, TagToken>, tag: Tag) -> Tag {
    if lex.next().is_none() {
        tag
    } else {
        Tag::Unknown
    }
}

fn rest(lex: &Lexer<'_, TagToken>) -> Option<String> {
    let rest = lex.remainder().trim();
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

/// Tokens of a filter argument list such as `"a, b", 3, user.name`
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum ArgToken {
    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice(), '"'))]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| unescape(lex.slice(), '\''))]
    Quoted(String),

    #[token(",")]
    Comma,

    // Runs to the next comma; resolved as an expression
    #[regex(r#"[^,"'\s][^,]*"#, |lex| lex.slice().trim().to_string())]
    Bare(String),
}

/// Strip the surrounding quotes and undo `\<quote>` and `\\` escapes
fn unescape(slice: &str, quote: char) -> String {
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next) if next == quote || next == '\\' => out.push(next),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}
