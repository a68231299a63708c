//! Ashe - A small text template engine that never evaluates host code
//!
//! Templates mix literal text with `{{ expr | filter }}` markers and
//! `{% if %}`, `{% for %}` and `{% set %}` control blocks. Rendering runs in
//! three passes: markers are replaced by placeholders, control blocks are
//! folded into directive placeholders, and the evaluator substitutes every
//! placeholder depth-first against the data context.
//!
//! # Example
//!
//! ```rust
//! use ashe::render;
//! use serde_json::json;
//!
//! let out = render(
//!     "{% for n in names %}Hi {{ n | capitalize }}! {% endfor %}",
//!     json!({"names": ["ada", "grace"]}),
//! )
//! .unwrap();
//! assert_eq!(out, "Hi Ada! Hi Grace! ");
//! ```

pub mod config;
pub mod error;
pub mod parser;
pub mod template;
pub mod value;

pub use config::{ConfigError, EngineConfig};
pub use error::RenderError;
pub use template::{FilterError, FilterRegistry};
pub use value::{Context, Map, Value};

use parser::TokenTable;
use template::Evaluator;

/// Configuration for a render call
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    /// Debug mode: undefined loop sources become errors
    pub debug: bool,
    /// Data available to every render, beneath the call's own data
    pub globals: Context,
}

impl RenderConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable debug mode
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the global data
    pub fn with_globals(mut self, globals: impl Into<Context>) -> Self {
        self.globals = globals.into();
        self
    }
}

/// A filter registry plus render configuration
///
/// `render` takes `&self` and keeps all per-call state on its own stack, so
/// one engine can be shared across threads and called again from inside a
/// filter or accessor.
#[derive(Debug, Clone)]
pub struct Engine {
    filters: FilterRegistry,
    config: RenderConfig,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine with the built-in filters
    pub fn new() -> Self {
        Self::with_config(RenderConfig::default())
    }

    /// Engine with no filters registered
    pub fn bare() -> Self {
        Self {
            filters: FilterRegistry::new(),
            config: RenderConfig::default(),
        }
    }

    /// Engine with the built-in filters and a custom configuration
    pub fn with_config(config: RenderConfig) -> Self {
        Self {
            filters: FilterRegistry::with_builtins(),
            config,
        }
    }

    /// Register a single filter, replacing any filter of the same name
    pub fn register_filter<F>(&mut self, name: impl Into<String>, filter: F) -> &mut Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, FilterError> + Send + Sync + 'static,
    {
        self.filters.register(name, filter);
        self
    }

    /// Merge a set of filters into the engine; incoming filters win on collision
    pub fn register_filters(&mut self, filters: FilterRegistry) -> &mut Self {
        self.filters.register_filters(filters);
        self
    }

    pub fn set_debug(&mut self, debug: bool) -> &mut Self {
        self.config.debug = debug;
        self
    }

    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render `template` against `data`
    ///
    /// # Example
    ///
    /// ```rust
    /// use ashe::{Engine, Value};
    ///
    /// let mut engine = Engine::new();
    /// engine.register_filter("twice", |v: &Value, _: &[Value]| {
    ///     Ok(Value::from(format!("{0}{0}", v)))
    /// });
    ///
    /// let data = serde_json::json!({"word": "ha"});
    /// assert_eq!(engine.render("{{ word | twice }}", data).unwrap(), "haha");
    /// ```
    pub fn render(&self, template: &str, data: impl Into<Context>) -> Result<String, RenderError> {
        let mut ctx = data.into();
        ctx.merge_defaults(&self.config.globals);

        let mut table = TokenTable::new();
        let text = parser::flatten(template, &mut table);
        tracing::debug!(tokens = table.len(), "template flattened");

        let out = Evaluator::new(&table, &self.filters, self.config.debug).render(&text, &mut ctx)?;
        tracing::debug!(bytes = out.len(), "template rendered");
        Ok(out)
    }
}

/// Render `template` against `data` with the built-in filters
pub fn render(template: &str, data: impl Into<Context>) -> Result<String, RenderError> {
    Engine::new().render(template, data)
}
