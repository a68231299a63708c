//! Filter pipeline: pipes a resolved value through a marker's filter chain

use logos::Logos;

use super::registry::FilterRegistry;
use super::resolver::resolve;
use crate::error::RenderError;
use crate::parser::lexer::ArgToken;
use crate::value::{Context, Value};

/// Apply `filters` left to right, each output feeding the next filter
pub fn apply_filters(
    ctx: &Context,
    registry: &FilterRegistry,
    value: Value,
    filters: &[String],
) -> Result<Value, RenderError> {
    filters.iter().try_fold(value, |value, filter| {
        let (name, args) = split_filter(filter);
        let func = registry
            .get(name)
            .ok_or_else(|| RenderError::UnknownFilter {
                filter: filter.clone(),
            })?;
        let args = match args {
            Some(args) => explode_args(ctx, args)?,
            None => Vec::new(),
        };
        (**func)(&value, &args).map_err(|source| RenderError::Filter {
            name: name.to_string(),
            source,
        })
    })
}

/// Split `name(args)` into its name and raw argument string
///
/// Anything that is not an identifier followed by a parenthesised list is
/// taken whole as the filter name.
pub fn split_filter(filter: &str) -> (&str, Option<&str>) {
    let filter = filter.trim();
    if let Some(open) = filter.find('(') {
        let name = filter[..open].trim();
        if filter.ends_with(')') && is_identifier(name) {
            return (name, Some(&filter[open + 1..filter.len() - 1]));
        }
    }
    (filter, None)
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split a comma-separated argument list
///
/// Quoted arguments are literals; bare arguments are resolved against `ctx`.
/// Text between a closing quote and the next comma is ignored. An
/// unterminated quote fails the whole render.
pub fn explode_args(ctx: &Context, args: &str) -> Result<Vec<Value>, RenderError> {
    let mut values = Vec::new();
    let mut current: Option<Value> = None;
    let mut lex = ArgToken::lexer(args);

    while let Some(token) = lex.next() {
        match token {
            Ok(ArgToken::Quoted(literal)) if current.is_none() => {
                current = Some(Value::from(literal));
            }
            Ok(ArgToken::Bare(expr)) if current.is_none() => {
                current = Some(resolve(ctx, &expr));
            }
            Ok(ArgToken::Quoted(_) | ArgToken::Bare(_)) => {}
            Ok(ArgToken::Comma) => values.push(current.take().unwrap_or_else(Value::empty)),
            Err(()) => {
                return Err(RenderError::MalformedArguments {
                    args: args.to_string(),
                })
            }
        }
    }

    values.extend(current);
    Ok(values)
}
