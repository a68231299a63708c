//! Filter registry: the named transformations markers can pipe values through

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::value::Value;

/// Errors a filter implementation can report
#[derive(Debug, Error)]
pub enum FilterError {
    /// A required argument was not supplied
    #[error("missing argument {index} for filter {filter}")]
    MissingArgument { filter: String, index: usize },

    /// An argument had the wrong shape
    #[error("invalid argument for filter {filter}: {message}")]
    InvalidArgument { filter: String, message: String },

    /// Free-form failure from a user filter
    #[error("{0}")]
    Custom(String),
}

/// A filter receives the piped value followed by its parsed arguments
pub type FilterFn = dyn Fn(&Value, &[Value]) -> Result<Value, FilterError> + Send + Sync;

/// Registry for storing filters by name
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Arc<FilterFn>>,
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("FilterRegistry")
            .field("filters", &names)
            .finish()
    }
}

impl FilterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in filters
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        super::filters::register_builtins(&mut registry);
        registry
    }

    /// Register a filter, replacing any previous one with the same name
    pub fn register<F>(&mut self, name: impl Into<String>, filter: F) -> &mut Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, FilterError> + Send + Sync + 'static,
    {
        self.filters.insert(name.into(), Arc::new(filter));
        self
    }

    /// Merge another registry into this one; on collision the incoming filter wins
    pub fn register_filters(&mut self, other: FilterRegistry) -> &mut Self {
        self.filters.extend(other.filters);
        self
    }

    /// Get a filter by name
    pub fn get(&self, name: &str) -> Option<&Arc<FilterFn>> {
        self.filters.get(name)
    }

    /// Check if a filter exists
    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Get all filter names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
