//! Parser passes that flatten a template into placeholders and tokens

pub mod ast;
mod controls;
pub mod lexer;
mod markers;

pub use ast::{Directive, Token, TokenTable};
pub use controls::extract_controls;
pub use markers::extract_markers;

/// Run both passes over `template`, recording tokens in `table`
pub fn flatten(template: &str, table: &mut TokenTable) -> String {
    let text = extract_markers(template, table);
    extract_controls(text, table)
}
