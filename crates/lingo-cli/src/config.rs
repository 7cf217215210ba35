//! Backend configuration file loading.
//!
//! The file names a mode and carries a section per mode; loading collapses
//! it into the [`BackendConfig`] sum type so downstream code never sees a
//! half-configured mode. Any problem here aborts startup.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use lingo_backend::{BackendConfig, RemoteConfig, ServerConfig};

/// Errors from loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// On-disk shape of `lingo.json`.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    mode: String,
    remote: Option<RemoteConfig>,
    local: Option<ServerConfig>,
}

/// Load and validate the backend configuration from `path`.
pub fn load(path: &Path) -> Result<BackendConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

fn parse(content: &str) -> Result<BackendConfig, ConfigError> {
    let file: ConfigFile = serde_json::from_str(content)?;

    let config = match file.mode.as_str() {
        "remote" => {
            let remote = file.remote.ok_or_else(|| {
                ConfigError::Invalid("mode is \"remote\" but no remote section given".to_string())
            })?;
            BackendConfig::Remote(remote)
        }
        "local" => {
            let local = file.local.ok_or_else(|| {
                ConfigError::Invalid("mode is \"local\" but no local section given".to_string())
            })?;
            BackendConfig::Local(local)
        }
        other => {
            return Err(ConfigError::Invalid(format!(
                "unknown mode \"{other}\" (expected \"remote\" or \"local\")"
            )))
        }
    };

    config
        .validate()
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;
    Ok(config)
}
