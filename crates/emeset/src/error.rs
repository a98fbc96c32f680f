//! Error types for the framework core.
//!
//! Each component owns a small error enum. Controllers and middleware return
//! `anyhow::Result`, so any of these converts into a handler error with `?`.

use thiserror::Error;

/// Errors raised while resolving services from the [`Container`](crate::Container).
#[derive(Debug, Error)]
pub enum ContainerError {
    /// No factory is registered under this identifier.
    #[error("identifier \"{0}\" is not defined")]
    NotFound(String),

    /// The service exists but holds a different type than the one requested.
    #[error("service \"{id}\" is not a {expected}")]
    TypeMismatch {
        /// Service identifier
        id: String,
        /// Requested type name
        expected: &'static str,
    },

    /// The factory itself failed.
    #[error("failed to build service \"{id}\": {source}")]
    Factory {
        /// Service identifier
        id: String,
        /// Underlying failure
        #[source]
        source: anyhow::Error,
    },
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("config root must be a mapping")]
    NotAMapping,

    #[error("unsupported config extension: {0}")]
    UnsupportedFormat(String),
}

/// Errors raised by the routers.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Nothing matched and no fallback route (key `0`) is registered.
    #[error("no route for {method} {key} and no fallback route registered")]
    NoRoute {
        /// Request method as seen by the router
        method: String,
        /// Route key that failed to match
        key: String,
    },
}

/// Errors raised while resolving handler references.
#[derive(Debug, Error)]
pub enum CallerError {
    #[error("class \"{0}\" is not registered")]
    UnknownClass(String),

    #[error("class \"{class}\" has no method \"{method}\"")]
    UnknownMethod { class: String, method: String },

    #[error("invalid handler reference \"{0}\", expected \"Class:method\"")]
    Malformed(String),

    #[error("failed to construct \"{class}\": {source}")]
    Construct {
        class: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Errors raised while rendering views.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<minijinja::Error> for ViewError {
    fn from(err: minijinja::Error) -> Self {
        match err.kind() {
            minijinja::ErrorKind::TemplateNotFound => ViewError::TemplateNotFound(err.to_string()),
            _ => ViewError::Template(err.to_string()),
        }
    }
}
