//! Session controller: the orchestration layer between the CLI, storage,
//! and the backend.
//!
//! The state machine is deliberately small: `NoSession -> ActiveSession`,
//! with the terminal reset being process exit. While active, each
//! `send_message` call runs one full turn — persist the user's message,
//! window the history, dispatch, persist the reply — before control
//! returns, so there is never more than one outstanding backend call.

use thiserror::Error;
use tracing::{debug, info};

use lingo_backend::{BackendError, ChatBackend};
use lingo_chat::{Role, Session, TutorProfile};
use lingo_store::{SessionStore, StoreError};

/// Errors surfaced to the caller of the session controller.
#[derive(Debug, Error)]
pub enum SessionError {
    /// `send_message` was invoked before any session was started.
    #[error("no active learning session")]
    NoActiveSession,

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Backend failure, propagated unchanged. No retry happens here; the
    /// caller decides whether to try again.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Drives one tutoring conversation against a [`ChatBackend`].
pub struct SessionController<B> {
    store: SessionStore,
    backend: B,
    session: Option<Session>,
}

impl<B: ChatBackend> SessionController<B> {
    /// Create a controller in the `NoSession` state.
    pub fn new(store: SessionStore, backend: B) -> Self {
        Self {
            store,
            backend,
            session: None,
        }
    }

    /// The active session, if one has been started.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Start a new session and return the teacher's welcome message.
    ///
    /// The welcome is recorded as the first assistant turn so it is part of
    /// the history subsequent requests are encoded from.
    pub fn start_session(
        &mut self,
        language: &str,
        level: &str,
        topic: &str,
    ) -> Result<String, SessionError> {
        let session = self.store.create_session(language, level, topic)?;
        info!(id = session.id, language, level, topic, "session started");

        let welcome = format!(
            "Hello! I'm your {language} teacher. We'll be practicing {topic} at {level} level. How can I help you today?"
        );
        self.store
            .append_turn(session.id, Role::Assistant, &welcome)?;

        self.session = Some(session);
        Ok(welcome)
    }

    /// Send one user message and return the assistant's reply.
    ///
    /// On failure the session state is unchanged, except that the user turn
    /// stays recorded if it was persisted before the failure — the
    /// conversation is never silently lost.
    pub async fn send_message(&mut self, text: &str) -> Result<String, SessionError> {
        let session = self.session.as_ref().ok_or(SessionError::NoActiveSession)?;
        let profile = TutorProfile::from(session);
        let session_id = session.id;

        self.store.append_turn(session_id, Role::User, text)?;

        let window = self.backend.history_window();
        let turns = self.store.recent_turns(session_id, window)?;
        debug!(session_id, window, turns = turns.len(), "dispatching turn");

        let reply = self.backend.generate(&profile, &turns).await?;

        self.store
            .append_turn(session_id, Role::Assistant, &reply)?;
        Ok(reply)
    }
}
