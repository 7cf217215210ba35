//! Error types for the local backend.

use thiserror::Error;

/// Errors from managing or talking to the local inference server.
#[derive(Debug, Error)]
pub enum LocalError {
    /// The server process could not be launched, or exited immediately.
    #[error("failed to start local server: {0}")]
    ServerStartFailed(String),

    /// The readiness poll expired before the server answered.
    #[error("timed out waiting for local server to become ready")]
    StartTimeout,

    /// TCP connect to the server failed.
    #[error("connect to {addr} failed: {reason} (is the local server running?)")]
    Connect { addr: String, reason: String },

    /// A connect or read exceeded its deadline.
    #[error("request to local server timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The response had no header/body boundary or was otherwise not HTTP.
    #[error("malformed HTTP response from local server: {0}")]
    MalformedResponse(String),

    /// I/O error on the socket.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Request body could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
