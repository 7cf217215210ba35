//! Error types for session storage.

use thiserror::Error;

/// Errors that can occur while persisting or reading conversation state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite failure.
    #[error("storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Could not create the directory holding the database file.
    #[error("failed to create database directory: {0}")]
    DirCreationFailed(String),

    /// A stored row referenced a role the client does not know.
    #[error("corrupt message row: {0}")]
    InvalidRole(#[from] lingo_chat::ParseRoleError),

    /// Lookup of a session that does not exist.
    #[error("no session with id {0}")]
    SessionNotFound(i64),
}
