//! # Lingo backend integration
//!
//! This crate turns conversation state into backend requests and replies.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │  Recent turns +  │ --> │    Dispatcher    │ --> │  Assistant text  │
//! │  tutor profile   │     │  (Remote/Local)  │     │                  │
//! └──────────────────┘     └──────────────────┘     └──────────────────┘
//!                                 │
//!                       ┌─────────┴─────────┐
//!                       │  encoder + client │
//!                       └───────────────────┘
//! ```
//!
//! The mode branch lives in the dispatcher and nowhere else: the encoder and
//! the two transports are mode-parametrized data.

mod config;
mod dispatcher;
pub mod encoder;
mod error;
mod remote;

pub use config::{BackendConfig, RemoteConfig, DEFAULT_REMOTE_PORT};
pub use dispatcher::{Backend, ChatBackend};
pub use error::BackendError;
pub use remote::RemoteClient;

// Re-export local backend types so consumers need only this crate.
pub use lingo_local::{
    CompletionClient, LlamaServer, LocalError, ServerConfig, DEFAULT_PORT as DEFAULT_LOCAL_PORT,
};
