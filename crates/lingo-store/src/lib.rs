//! SQLite persistence for Lingo.
//!
//! The rest of the workspace talks to storage through the narrow
//! [`SessionStore`] contract: create a session, append a turn, read back the
//! most recent turns. Nothing here knows about backends or prompts.

mod error;

pub use error::StoreError;

use std::path::Path;

use rusqlite::{params, Connection};
use tracing::{debug, info};

use lingo_chat::{Role, Session, Turn};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    language TEXT NOT NULL,
    level TEXT NOT NULL,
    topic TEXT NOT NULL,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id INTEGER NOT NULL,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (session_id) REFERENCES sessions (id)
);
"#;

/// Store for learning sessions and their conversation turns.
///
/// Single-connection, synchronous. The client drives one turn at a time, so
/// there is no concurrent access to guard against.
pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::DirCreationFailed(e.to_string()))?;
            }
        }
        info!(path = %path.display(), "opening session store");
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory store. Used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Create a new learning session and return the persisted record.
    pub fn create_session(
        &self,
        language: &str,
        level: &str,
        topic: &str,
    ) -> Result<Session, StoreError> {
        self.conn.execute(
            "INSERT INTO sessions (language, level, topic) VALUES (?1, ?2, ?3)",
            params![language, level, topic],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, language, level, topic, "created session");
        self.session(id)
    }

    /// Look up a session by id.
    pub fn session(&self, id: i64) -> Result<Session, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, language, level, topic, created_at FROM sessions WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], |row| {
            Ok(Session {
                id: row.get(0)?,
                language: row.get(1)?,
                level: row.get(2)?,
                topic: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        match rows.next() {
            Some(session) => Ok(session?),
            None => Err(StoreError::SessionNotFound(id)),
        }
    }

    /// Append one turn to a session's conversation.
    pub fn append_turn(
        &self,
        session_id: i64,
        role: Role,
        content: &str,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO messages (session_id, role, content) VALUES (?1, ?2, ?3)",
            params![session_id, role.as_str(), content],
        )?;
        debug!(session_id, role = %role, "appended turn");
        Ok(())
    }

    /// The most recent `limit` turns of a session, ordered oldest to newest.
    ///
    /// `CURRENT_TIMESTAMP` has second resolution, so the rowid breaks ties
    /// between turns appended within the same second.
    pub fn recent_turns(&self, session_id: i64, limit: usize) -> Result<Vec<Turn>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, role, content, timestamp FROM (
                 SELECT id, session_id, role, content, timestamp
                     FROM messages
                     WHERE session_id = ?1
                     ORDER BY timestamp DESC, id DESC
                     LIMIT ?2
             )
             ORDER BY timestamp ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![session_id, limit as i64], |row| {
            let role: String = row.get(1)?;
            Ok((
                row.get::<_, i64>(0)?,
                role,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut turns = Vec::new();
        for row in rows {
            let (session_id, role, content, timestamp) = row?;
            turns.push(Turn {
                session_id,
                role: role.parse()?,
                content,
                timestamp,
            });
        }
        Ok(turns)
    }

    /// Total number of turns recorded for a session.
    pub fn turn_count(&self, session_id: i64) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_session() -> (SessionStore, Session) {
        let store = SessionStore::open_in_memory().unwrap();
        let session = store
            .create_session("French", "intermediate", "travel")
            .unwrap();
        (store, session)
    }

    #[test]
    fn test_create_session_round_trip() {
        let (store, session) = store_with_session();
        assert_eq!(session.language, "French");
        assert!(!session.created_at.is_empty());

        let loaded = store.session(session.id).unwrap();
        assert_eq!(loaded, session);
    }

    #[test]
    fn test_session_not_found() {
        let store = SessionStore::open_in_memory().unwrap();
        assert!(matches!(
            store.session(42),
            Err(StoreError::SessionNotFound(42))
        ));
    }

    #[test]
    fn test_recent_turns_window_and_order() {
        let (store, session) = store_with_session();
        for i in 0..5 {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            store
                .append_turn(session.id, role, &format!("message {i}"))
                .unwrap();
        }

        let turns = store.recent_turns(session.id, 3).unwrap();
        assert_eq!(turns.len(), 3);
        // Oldest-to-newest within the window of the 3 most recent.
        assert_eq!(turns[0].content, "message 2");
        assert_eq!(turns[1].content, "message 3");
        assert_eq!(turns[2].content, "message 4");
        assert_eq!(turns[2].role, Role::User);
    }

    #[test]
    fn test_recent_turns_smaller_history() {
        let (store, session) = store_with_session();
        store.append_turn(session.id, Role::User, "hi").unwrap();

        let turns = store.recent_turns(session.id, 10).unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].content, "hi");
    }

    #[test]
    fn test_turns_scoped_to_session() {
        let (store, session) = store_with_session();
        let other = store.create_session("German", "beginner", "work").unwrap();
        store.append_turn(session.id, Role::User, "bonjour").unwrap();
        store.append_turn(other.id, Role::User, "hallo").unwrap();

        let turns = store.recent_turns(session.id, 10).unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].content, "bonjour");
        assert_eq!(store.turn_count(other.id).unwrap(), 1);
    }
}
