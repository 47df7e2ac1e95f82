//! Server configuration read from `formbind.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Runtime configuration. Every key is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP API binds to.
    #[serde(default = "default_listen")]
    pub listen: String,
    /// JSON schema document with the registered types.
    #[serde(default = "default_schema_path")]
    pub schema_path: PathBuf,
    /// Default for requests that do not pass `overwrite`.
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,
}

fn default_listen() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("schema.json")
}

fn default_overwrite() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            schema_path: default_schema_path(),
            overwrite: default_overwrite(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Loads the config file, or defaults when `path` does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
