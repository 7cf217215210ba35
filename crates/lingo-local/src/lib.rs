//! Local inference backend for Lingo.
//!
//! Owns the llama-server child process and speaks its plain-HTTP completion
//! protocol over the loopback interface. The process never shares memory
//! with the client; all communication goes through the socket.

mod error;
mod http;
mod server;

pub use error::LocalError;
pub use http::{CompletionClient, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT};
pub use server::{LlamaServer, ServerConfig};

/// Default port for the local llama-server instance.
pub const DEFAULT_PORT: u16 = 8089;
