//! Built-in filters

use super::registry::{FilterError, FilterRegistry};
use crate::value::Value;

/// Register every built-in filter
pub fn register_builtins(registry: &mut FilterRegistry) {
    registry
        .register("upper", filter_upper)
        .register("lower", filter_lower)
        .register("capitalize", filter_capitalize)
        .register("trim", filter_trim)
        .register("length", filter_length)
        .register("default", filter_default)
        .register("join", filter_join)
        .register("truncate", filter_truncate)
        .register("replace", filter_replace)
        .register("escape", filter_escape)
        .register("slugify", filter_slugify)
        .register("json", filter_json);
}

fn arg<'a>(filter: &str, args: &'a [Value], index: usize) -> Result<&'a Value, FilterError> {
    args.get(index).ok_or_else(|| FilterError::MissingArgument {
        filter: filter.to_string(),
        index,
    })
}

fn filter_upper(value: &Value, _: &[Value]) -> Result<Value, FilterError> {
    Ok(Value::from(value.to_string().to_uppercase()))
}

fn filter_lower(value: &Value, _: &[Value]) -> Result<Value, FilterError> {
    Ok(Value::from(value.to_string().to_lowercase()))
}

fn filter_capitalize(value: &Value, _: &[Value]) -> Result<Value, FilterError> {
    let text = value.to_string();
    let mut chars = text.chars();
    let out = match chars.next() {
        None => String::new(),
        Some(first) => {
            let mut result = first.to_uppercase().to_string();
            result.extend(chars);
            result
        }
    };
    Ok(Value::from(out))
}

fn filter_trim(value: &Value, _: &[Value]) -> Result<Value, FilterError> {
    Ok(Value::from(value.to_string().trim()))
}

fn filter_length(value: &Value, _: &[Value]) -> Result<Value, FilterError> {
    Ok(Value::from(value.length().unwrap_or(0)))
}

/// `default(fallback)`: the fallback when the value is falsy
fn filter_default(value: &Value, args: &[Value]) -> Result<Value, FilterError> {
    if value.is_truthy() {
        Ok(value.clone())
    } else {
        arg("default", args, 0).cloned()
    }
}

/// `join(sep)`: sequence elements joined by `sep` (default `,`)
fn filter_join(value: &Value, args: &[Value]) -> Result<Value, FilterError> {
    let sep = args.first().map(Value::to_string).unwrap_or_else(|| ",".to_string());
    match value {
        Value::Array(items) => Ok(Value::from(
            items
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join(&sep),
        )),
        other => Ok(Value::from(other.to_string())),
    }
}

/// `truncate(n)`: at most `n` characters (default 160), marking the cut with `…`
fn filter_truncate(value: &Value, args: &[Value]) -> Result<Value, FilterError> {
    let len = match args.first() {
        None => 160,
        Some(n) => n
            .as_f64()
            .filter(|n| *n >= 0.0 && n.fract() == 0.0)
            .map(|n| n as usize)
            .ok_or_else(|| FilterError::InvalidArgument {
                filter: "truncate".to_string(),
                message: format!("expected a non-negative integer, got \"{}\"", n),
            })?,
    };

    let text = value.to_string();
    if text.chars().count() <= len {
        return Ok(Value::from(text));
    }
    let mut cut: String = text.chars().take(len).collect();
    cut.push('\u{2026}');
    Ok(Value::from(cut))
}

/// `replace(from, to)`: every occurrence of `from` replaced by `to`
fn filter_replace(value: &Value, args: &[Value]) -> Result<Value, FilterError> {
    let from = arg("replace", args, 0)?.to_string();
    let to = arg("replace", args, 1)?.to_string();
    if from.is_empty() {
        return Err(FilterError::InvalidArgument {
            filter: "replace".to_string(),
            message: "pattern must not be empty".to_string(),
        });
    }
    Ok(Value::from(value.to_string().replace(&from, &to)))
}

fn filter_escape(value: &Value, _: &[Value]) -> Result<Value, FilterError> {
    let text = value.to_string();
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Ok(Value::from(out))
}

fn filter_slugify(value: &Value, _: &[Value]) -> Result<Value, FilterError> {
    let slug = value
        .to_string()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    Ok(Value::from(slug))
}

fn filter_json(value: &Value, _: &[Value]) -> Result<Value, FilterError> {
    serde_json::to_string(&value.to_json())
        .map(Value::from)
        .map_err(|e| FilterError::Custom(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_case_filters() {
        let v = Value::from("hello World");
        assert_eq!(filter_upper(&v, &[]).ok(), Some(Value::from("HELLO WORLD")));
        assert_eq!(filter_lower(&v, &[]).ok(), Some(Value::from("hello world")));
        assert_eq!(
            filter_capitalize(&Value::from("élan"), &[]).ok(),
            Some(Value::from("Élan"))
        );
    }

    #[test]
    fn test_default_only_replaces_falsy() {
        let fallback = [Value::from("n/a")];
        assert_eq!(filter_default(&Value::empty(), &fallback).ok(), Some(Value::from("n/a")));
        assert_eq!(filter_default(&Value::from("x"), &fallback).ok(), Some(Value::from("x")));
        assert!(matches!(
            filter_default(&Value::empty(), &[]),
            Err(FilterError::MissingArgument { index: 0, .. })
        ));
    }

    #[test]
    fn test_join() {
        let v = Value::from(vec!["a", "b"]);
        assert_eq!(filter_join(&v, &[]).ok(), Some(Value::from("a,b")));
        assert_eq!(
            filter_join(&v, &[Value::from(" / ")]).ok(),
            Some(Value::from("a / b"))
        );
    }

    #[test]
    fn test_truncate() {
        let v = Value::from("abcdef");
        assert_eq!(filter_truncate(&v, &[Value::from(3)]).ok(), Some(Value::from("abc…")));
        assert_eq!(filter_truncate(&v, &[Value::from("10")]).ok(), Some(v.clone()));
        assert!(matches!(
            filter_truncate(&v, &[Value::from("many")]),
            Err(FilterError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_replace_requires_both_arguments() {
        let v = Value::from("a-b-c");
        assert_eq!(
            filter_replace(&v, &[Value::from("-"), Value::from("+")]).ok(),
            Some(Value::from("a+b+c"))
        );
        assert!(filter_replace(&v, &[Value::from("-")]).is_err());
    }

    #[test]
    fn test_escape_and_slugify() {
        assert_eq!(
            filter_escape(&Value::from("<a href=\"x\">"), &[]).ok(),
            Some(Value::from("&lt;a href=&quot;x&quot;&gt;"))
        );
        assert_eq!(
            filter_slugify(&Value::from("Hello, World!"), &[]).ok(),
            Some(Value::from("hello-world"))
        );
    }

    #[test]
    fn test_json_and_length() {
        let v = Value::from(json!({"a": [1, true]}));
        assert_eq!(filter_json(&v, &[]).ok(), Some(Value::from(r#"{"a":[1,true]}"#)));
        assert_eq!(filter_length(&Value::from(vec![1, 2]), &[]).ok(), Some(Value::from(2)));
    }
}
