//! Application configuration.
//!
//! [`Config`] is a thin wrapper over a JSON object. It can be loaded from a
//! `.json`, `.yaml` or `.yml` file, or assembled in code with [`Config::set`].
//!
//! Lookups accept dotted paths, so `get("views.dir")` reads the `dir` key of
//! the `views` mapping.
//!
//! # Known keys
//!
//! | Key | Default | Meaning |
//! |-----|---------|---------|
//! | `views` | `"views"` | Template directory |
//! | `router` | `"http"` | Router strategy: `"http"` or `"param"` |

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Key-value configuration shared through the container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    values: Map<String, Value>,
}

impl Config {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from a JSON value. The value must be an object.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            Value::Null => Ok(Self::new()),
            _ => Err(ConfigError::NotAMapping),
        }
    }

    /// Loads a configuration file, picking the parser from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match ext.as_str() {
            "json" => Self::from_value(serde_json::from_str(&content)?),
            "yaml" | "yml" => Self::from_value(serde_yaml::from_str(&content)?),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Sets a top-level key, returning self for chaining.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Looks up a value by dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.values.get(first)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Looks up a string value by dotted path.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Looks up a boolean value by dotted path.
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    /// Returns true if the path resolves to a value.
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Returns the underlying mapping.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }
}
