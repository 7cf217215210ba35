//! Shared conversation types for Lingo.
//!
//! These are the records every other crate speaks in terms of: a learning
//! [`Session`], the [`Turn`]s exchanged within it, and the [`TutorProfile`]
//! used to synthesize the system prompt.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who authored a turn in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// The wire/storage representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when a stored role string is not one of the known roles.
#[derive(Debug, Clone, Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

/// A persisted learning session. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub language: String,
    pub level: String,
    pub topic: String,
    pub created_at: String,
}

/// One message in a session's conversation, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub session_id: i64,
    pub role: Role,
    pub content: String,
    pub timestamp: String,
}

/// The tutoring parameters a session was started with.
///
/// Separated from [`Session`] so prompt encoding can be exercised without a
/// database row behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorProfile {
    pub language: String,
    pub level: String,
    pub topic: String,
}

impl From<&Session> for TutorProfile {
    fn from(session: &Session) -> Self {
        Self {
            language: session.language.clone(),
            level: session.level.clone(),
            topic: session.topic.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::System, Role::User, Role::Assistant] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role() {
        let err = "tool".parse::<Role>().unwrap_err();
        assert_eq!(err.0, "tool");
    }

    #[test]
    fn test_profile_from_session() {
        let session = Session {
            id: 1,
            language: "Spanish".to_string(),
            level: "beginner".to_string(),
            topic: "ordering food".to_string(),
            created_at: "2024-01-01 00:00:00".to_string(),
        };
        let profile = TutorProfile::from(&session);
        assert_eq!(profile.language, "Spanish");
        assert_eq!(profile.topic, "ordering food");
    }
}
