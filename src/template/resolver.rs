//! Expression resolution against a data context
//!
//! An expression is either a quoted literal (`'text'` or `"text"`, returned
//! verbatim) or a dotted path such as `user.address.city`. Paths address
//! mapping keys, sequence indices and the `length` of sequences and strings.

use crate::value::{Context, Value};

/// Resolve `expr` for output or a condition
///
/// Any absent or falsy step yields the empty string, including legitimate
/// `0` and `false` values. A final accessor is invoked with `ctx`.
pub fn resolve(ctx: &Context, expr: &str) -> Value {
    if let Some(literal) = quoted_literal(expr) {
        return Value::from(literal);
    }
    traverse(ctx, expr, Value::is_truthy).unwrap_or_else(Value::empty)
}

/// Resolve `expr` keeping falsy values
///
/// Returns `None` only when a step is missing or null, which is how loops
/// tell an undefined source apart from an empty one.
pub fn lookup(ctx: &Context, expr: &str) -> Option<Value> {
    if let Some(literal) = quoted_literal(expr) {
        return Some(Value::from(literal));
    }
    traverse(ctx, expr, |v| !v.is_null())
}

/// Content of a literal wrapped in one matching pair of quotes
fn quoted_literal(expr: &str) -> Option<&str> {
    let first = expr.chars().next()?;
    if expr.len() >= 2 && (first == '"' || first == '\'') && expr.ends_with(first) {
        Some(&expr[1..expr.len() - 1])
    } else {
        None
    }
}

fn traverse(ctx: &Context, expr: &str, keep: impl Fn(&Value) -> bool) -> Option<Value> {
    let mut segments = expr.split('.').peekable();
    let first = segments.next()?;
    let mut current = ctx.get(first).filter(|v| keep(v))?;

    while let Some(segment) = segments.next() {
        match current.field(segment) {
            Some(next) => current = next,
            None if segment == "length" && segments.peek().is_none() => {
                return current.length().map(Value::from).filter(|v| keep(v));
            }
            None => return None,
        }
        if !keep(current) {
            return None;
        }
    }

    Some(match current {
        Value::Accessor(accessor) => accessor.call(ctx),
        other => other.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(data: serde_json::Value) -> Context {
        Context::from(data)
    }

    #[test]
    fn test_quoted_literals_bypass_lookup() {
        let ctx = ctx(json!({"x": "data"}));
        assert_eq!(resolve(&ctx, "'x'"), Value::from("x"));
        assert_eq!(resolve(&ctx, "\"a.b\""), Value::from("a.b"));
        // mismatched quotes are a path, not a literal
        assert_eq!(resolve(&ctx, "'x\""), Value::empty());
    }

    #[test]
    fn test_nested_path() {
        let ctx = ctx(json!({"a": {"b": {"c": "v"}}}));
        assert_eq!(resolve(&ctx, "a.b.c"), Value::from("v"));
        assert_eq!(resolve(&ctx, "a.x.c"), Value::empty());
        assert_eq!(resolve(&ctx, "missing"), Value::empty());
    }

    #[test]
    fn test_falsy_values_resolve_empty() {
        let ctx = ctx(json!({"zero": 0, "no": false, "blank": ""}));
        assert_eq!(resolve(&ctx, "zero"), Value::empty());
        assert_eq!(resolve(&ctx, "no"), Value::empty());
        assert_eq!(lookup(&ctx, "zero"), Some(Value::from(0)));
        assert_eq!(lookup(&ctx, "no"), Some(Value::from(false)));
    }

    #[test]
    fn test_lookup_distinguishes_missing() {
        let ctx = ctx(json!({"items": [], "nothing": null}));
        assert_eq!(lookup(&ctx, "items"), Some(Value::Array(vec![])));
        assert_eq!(lookup(&ctx, "nothing"), None);
        assert_eq!(lookup(&ctx, "absent.deeper"), None);
    }

    #[test]
    fn test_indices_and_length() {
        let ctx = ctx(json!({"items": ["a", "b", "c"], "name": "ashe"}));
        assert_eq!(resolve(&ctx, "items.1"), Value::from("b"));
        assert_eq!(resolve(&ctx, "items.length"), Value::from(3));
        assert_eq!(resolve(&ctx, "name.length"), Value::from(4));
    }

    #[test]
    fn test_accessor_is_invoked_with_context() {
        let mut ctx = ctx(json!({"first": "Ada", "last": "Lovelace"}));
        ctx.set(
            "full",
            Value::accessor(|c| {
                let first = resolve(c, "first");
                let last = resolve(c, "last");
                Value::from(format!("{} {}", first, last))
            }),
        );
        assert_eq!(resolve(&ctx, "full"), Value::from("Ada Lovelace"));
    }

    #[test]
    fn test_accessor_result_is_not_checked_for_truthiness() {
        let mut ctx = Context::new();
        ctx.set("count", Value::accessor(|_| Value::from(0)));
        assert_eq!(resolve(&ctx, "count"), Value::from(0));
    }
}
