//! Runtime values and the data context templates are rendered against
//!
//! Values mirror the loose data a template sees: strings, numbers, booleans,
//! sequences, ordered mappings and zero-argument accessors. Truthiness and
//! text conversion follow the rules the template language has always used,
//! so `0`, `false` and `""` are falsy while every sequence and mapping is truthy.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

/// Ordered name → value mapping
pub type Map = IndexMap<String, Value>;

/// A zero-argument callable resolved lazily against the current context
#[derive(Clone)]
pub struct Accessor(Arc<dyn Fn(&Context) -> Value + Send + Sync>);

impl Accessor {
    /// Wrap a closure as an accessor
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Context) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the accessor with `ctx` as its receiver
    pub fn call(&self, ctx: &Context) -> Value {
        (*self.0)(ctx)
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Accessor(..)")
    }
}

impl PartialEq for Accessor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A template value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(Map),
    Accessor(Accessor),
}

impl Value {
    /// The empty string, which is what absent lookups resolve to
    pub fn empty() -> Self {
        Value::String(String::new())
    }

    /// Wrap a closure as an accessor value
    pub fn accessor<F>(f: F) -> Self
    where
        F: Fn(&Context) -> Value + Send + Sync + 'static,
    {
        Value::Accessor(Accessor::new(f))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness used by conditions and by the resolver's short-circuit
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Accessor(_) => true,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Length of sequences, strings (in characters) and mappings
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(items) => Some(items.len()),
            Value::Object(map) => Some(map.len()),
            _ => None,
        }
    }

    /// Whether a loop over this value would run at least once
    ///
    /// A mapping with its own `length` entry is non-empty only when that
    /// entry is truthy.
    pub fn has_elements(&self) -> bool {
        match self {
            Value::Object(map) => match map.get("length") {
                Some(len) => len.is_truthy(),
                None => !map.is_empty(),
            },
            other => other.length().is_some_and(|len| len > 0),
        }
    }

    /// Look up a single path segment: a mapping key or a sequence index
    pub fn field(&self, segment: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Key/value pairs in enumeration order
    ///
    /// Sequence and string keys are the stringified indices.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        match self {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (Value::String(i.to_string()), v.clone()))
                .collect(),
            Value::String(s) => s
                .chars()
                .enumerate()
                .map(|(i, c)| (Value::String(i.to_string()), Value::String(c.to_string())))
                .collect(),
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| (Value::String(k.clone()), v.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Convert into a JSON value; accessors become `null`
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null | Value::Accessor(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serde_json::Value::from(*n as i64)
            }
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Object(_) => f.write_str("[object Object]"),
            Value::Accessor(_) => f.write_str("[accessor]"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

impl_from_integer!(i32, i64, u32, u64, usize);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<toml::Value> for Value {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i as f64),
            toml::Value::Float(f) => Value::Number(f),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            toml::Value::Table(table) => {
                Value::Object(table.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// The mutable data context of one evaluation frame
///
/// Loops render each iteration against a [`Context::derive`]d copy, so
/// assignments made inside a loop body never reach the parent frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    vars: Map,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Assign `name` in place, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Shallow copy used as the scope of a single loop iteration
    pub fn derive(&self) -> Self {
        self.clone()
    }

    /// Bind every name from `other`, overwriting existing bindings
    pub fn extend(&mut self, other: Context) {
        self.vars.extend(other.vars);
    }

    /// Fill in names that are not already bound
    pub fn merge_defaults(&mut self, defaults: &Context) {
        for (name, value) in &defaults.vars {
            if !self.vars.contains_key(name) {
                self.vars.insert(name.clone(), value.clone());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl From<Map> for Context {
    fn from(vars: Map) -> Self {
        Self { vars }
    }
}

impl From<Value> for Context {
    /// Mappings become the context; any other value yields an empty context
    fn from(value: Value) -> Self {
        match value {
            Value::Object(vars) => Self { vars },
            _ => Self::default(),
        }
    }
}

impl From<serde_json::Value> for Context {
    fn from(json: serde_json::Value) -> Self {
        Context::from(Value::from(json))
    }
}

impl From<&Context> for Context {
    fn from(ctx: &Context) -> Self {
        ctx.clone()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
