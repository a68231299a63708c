//! Engine configuration loaded from TOML
//!
//! ```toml
//! debug = true
//! log_level = "debug"
//!
//! [globals]
//! site = "ashe"
//! nav = ["home", "about"]
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::value::{Context, Value};
use crate::RenderConfig;

/// Errors that can occur when loading or parsing a config file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Settings shared by every render of a configured engine
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Turn undefined loop sources into errors
    pub debug: bool,
    /// Log filter used by the CLI when `RUST_LOG` is unset
    pub log_level: Option<String>,
    /// Default template data
    pub globals: toml::Table,
}

impl EngineConfig {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load config from TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Globals as a data context
    pub fn globals(&self) -> Context {
        Context::from(Value::from(toml::Value::Table(self.globals.clone())))
    }
}

impl From<EngineConfig> for RenderConfig {
    fn from(config: EngineConfig) -> Self {
        RenderConfig::new()
            .with_debug(config.debug)
            .with_globals(config.globals())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_str("").expect("Should parse");
        assert!(!config.debug);
        assert_eq!(config.log_level, None);
        assert!(config.globals().is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
debug = true
log_level = "trace"

[globals]
site = "ashe"
year = 2024
nav = ["home", "about"]
"#;
        let config = EngineConfig::from_str(toml_str).expect("Should parse");
        assert!(config.debug);
        assert_eq!(config.log_level.as_deref(), Some("trace"));

        let globals = config.globals();
        assert_eq!(globals.get("site"), Some(&Value::from("ashe")));
        assert_eq!(globals.get("year"), Some(&Value::from(2024)));
        assert_eq!(globals.get("nav").and_then(Value::length), Some(2));
    }

    #[test]
    fn test_into_render_config() {
        let config = EngineConfig::from_str("debug = true\n[globals]\na = 'x'").expect("Should parse");
        let render: RenderConfig = config.into();
        assert!(render.debug);
        assert!(render.globals.contains("a"));
    }

    #[test]
    fn test_invalid_toml_error() {
        let result = EngineConfig::from_str("debug = = true");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_missing_file_error() {
        let result = EngineConfig::from_file(Path::new("/nonexistent/ashe.toml"));
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
