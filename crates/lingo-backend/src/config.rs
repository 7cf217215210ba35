//! Backend configuration.
//!
//! The two modes are a sum type rather than one struct with an active-mode
//! flag, so a remote configuration carrying local-server fields (or vice
//! versa) is unrepresentable.

use serde::Deserialize;

use crate::error::BackendError;
use lingo_local::ServerConfig;

/// Default HTTPS port for the remote endpoint.
pub const DEFAULT_REMOTE_PORT: u16 = 443;

fn default_remote_port() -> u16 {
    DEFAULT_REMOTE_PORT
}

/// Connection parameters for the remote inference endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Hostname of the endpoint, without scheme.
    pub host: String,
    #[serde(default = "default_remote_port")]
    pub port: u16,
    /// Static credential sent as a bearer token.
    pub api_key: String,
}

/// Which backend this process talks to. Fixed at load time; a process never
/// switches modes mid-session.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    Remote(RemoteConfig),
    Local(ServerConfig),
}

impl BackendConfig {
    /// Human-readable mode name, for logs and `lingo info`.
    pub fn mode(&self) -> &'static str {
        match self {
            BackendConfig::Remote(_) => "remote",
            BackendConfig::Local(_) => "local",
        }
    }

    /// How many recent turns are encoded into the context by default.
    ///
    /// The asymmetry (3 for remote, 1 for local) is inherited behavior kept
    /// as a named, overridable default rather than silently unified.
    pub fn default_history_window(&self) -> usize {
        match self {
            BackendConfig::Remote(_) => 3,
            BackendConfig::Local(_) => 1,
        }
    }

    /// Validate invariants that the type system cannot express.
    pub fn validate(&self) -> Result<(), BackendError> {
        match self {
            BackendConfig::Remote(remote) => {
                if remote.host.is_empty() {
                    return Err(BackendError::Config("remote host is empty".to_string()));
                }
                if remote.api_key.is_empty() {
                    return Err(BackendError::Config("remote api_key is empty".to_string()));
                }
            }
            BackendConfig::Local(local) => {
                if local.context_length == 0 {
                    return Err(BackendError::Config(
                        "local context_length must be positive".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn remote() -> RemoteConfig {
        RemoteConfig {
            host: "inference.example.com".to_string(),
            port: 443,
            api_key: "sk-test".to_string(),
        }
    }

    fn local() -> ServerConfig {
        ServerConfig {
            executable: PathBuf::from("/opt/llama-server"),
            model: PathBuf::from("/opt/model.gguf"),
            context_length: 4096,
            port: 8089,
            extra_args: vec![],
        }
    }

    #[test]
    fn test_default_windows() {
        assert_eq!(BackendConfig::Remote(remote()).default_history_window(), 3);
        assert_eq!(BackendConfig::Local(local()).default_history_window(), 1);
    }

    #[test]
    fn test_validate_ok() {
        assert!(BackendConfig::Remote(remote()).validate().is_ok());
        assert!(BackendConfig::Local(local()).validate().is_ok());
    }

    #[test]
    fn test_validate_missing_key() {
        let mut cfg = remote();
        cfg.api_key.clear();
        let err = BackendConfig::Remote(cfg).validate().unwrap_err();
        assert!(matches!(err, BackendError::Config(_)));
    }

    #[test]
    fn test_validate_zero_context() {
        let mut cfg = local();
        cfg.context_length = 0;
        let err = BackendConfig::Local(cfg).validate().unwrap_err();
        assert!(matches!(err, BackendError::Config(_)));
    }
}
