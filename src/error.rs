//! Error types for schema loading and request resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving a request against a schema.
///
/// None of these are failures from the client's point of view: the
/// dispatcher turns every variant into a `{"message": ...}` body.
#[derive(Debug, Error)]
pub enum FakerError {
    #[error("Schema reading failed. No routes found.")]
    SchemaMissingRoutes,

    #[error("Route not implemented ({path})")]
    NoRouteMatch { path: String },

    #[error("Route not implemented for method {method} ({route})")]
    MethodNotSupported { method: String, route: String },

    #[error("Invalid route pattern {pattern}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors raised while reading a schema document from disk.
#[derive(Debug, Error)]
pub enum SchemaLoadError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
