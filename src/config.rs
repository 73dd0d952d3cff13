//! Configuration for the faker server.
//!
//! Holds the server settings and reads schema documents from disk.

use crate::error::SchemaLoadError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Example schema shipped with the binary.
pub const EXAMPLE_SCHEMA: &str = include_str!("../demos/schema.json");

/// Server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Path to the schema document (JSON, or YAML by extension)
    #[serde(default = "default_schema")]
    pub schema: PathBuf,

    /// Address to listen on
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Where the path to resolve is read from
    #[serde(default)]
    pub path_source: PathSource,

    /// Query parameter carrying the path when `path_source` is `query`
    #[serde(default = "default_query_param")]
    pub query_param: String,

    /// Re-read the schema for every request
    #[serde(default = "default_true")]
    pub reload_schema: bool,

    /// Report routes without rule records at `warn` level
    #[serde(default)]
    pub show_warnings: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema: default_schema(),
            listen: default_listen(),
            path_source: PathSource::default(),
            query_param: default_query_param(),
            reload_schema: true,
            show_warnings: false,
        }
    }
}

impl Settings {
    /// Load settings from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_yaml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the settings.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.path_source == PathSource::Query && self.query_param.is_empty() {
            anyhow::bail!("query_param cannot be empty when path_source is query");
        }
        Ok(())
    }
}

/// Source of the path matched against the routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PathSource {
    /// A query parameter (`?q=/users/1`), `/` when absent or empty
    #[default]
    Query,
    /// The request URI path
    Uri,
}

fn default_schema() -> PathBuf {
    PathBuf::from("schema.json")
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_query_param() -> String {
    "q".to_string()
}

fn default_true() -> bool {
    true
}

/// Read a schema document from disk.
pub fn read_document(path: &Path) -> Result<Value, SchemaLoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| SchemaLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(path, &content)
}

/// Read a schema document from disk without blocking the runtime.
pub async fn read_document_async(path: &Path) -> Result<Value, SchemaLoadError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SchemaLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    parse_document(path, &content)
}

/// Decode a schema document. `.yaml` and `.yml` files are YAML, anything
/// else is JSON.
pub fn parse_document(path: &Path, content: &str) -> Result<Value, SchemaLoadError> {
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );

    if is_yaml {
        serde_yaml::from_str(content).map_err(|source| SchemaLoadError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_json::from_str(content).map_err(|source| SchemaLoadError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}
