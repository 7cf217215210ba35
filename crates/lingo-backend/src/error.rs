//! Error taxonomy for backend dispatch.

use thiserror::Error;

use lingo_local::LocalError;

/// Errors from configuring or calling a text-generation backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The supplied configuration is unusable.
    #[error("invalid backend configuration: {0}")]
    Config(String),

    /// Transport-level failure talking to the remote endpoint.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The remote endpoint answered with a non-2xx status.
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// The response body was not JSON or lacked the expected text field.
    #[error("failed to parse backend response: {0}")]
    ResponseParse(String),

    /// Failure from the local server transport or supervisor.
    #[error(transparent)]
    Local(#[from] LocalError),
}
