//! Backend dispatch.
//!
//! The single place where the remote/local mode branch lives. Everything
//! above this sees the [`ChatBackend`] trait; everything below is a
//! mode-specific transport plus an encoding style. Adding a third backend
//! means one transport, one encoder arm, and one match arm here.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use lingo_chat::{Turn, TutorProfile};
use lingo_local::CompletionClient;

use crate::config::BackendConfig;
use crate::encoder::{self, PromptStyle};
use crate::error::BackendError;
use crate::remote::RemoteClient;

/// A text-generation backend the session controller can drive.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// How many recent turns to feed into the context.
    fn history_window(&self) -> usize;

    /// Generate the assistant's next reply from the windowed history.
    async fn generate(
        &self,
        profile: &TutorProfile,
        turns: &[Turn],
    ) -> Result<String, BackendError>;
}

/// Request body for the remote completion endpoint.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

enum Transport {
    Remote(RemoteClient),
    Local(CompletionClient),
}

/// The production [`ChatBackend`]: one of the two transports plus the
/// matching prompt encoding.
pub struct Backend {
    transport: Transport,
    history_window: usize,
}

impl Backend {
    /// Build a backend from a validated configuration.
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        config.validate()?;
        let history_window = config.default_history_window();
        let transport = match config {
            BackendConfig::Remote(remote) => Transport::Remote(RemoteClient::new(remote)?),
            BackendConfig::Local(local) => Transport::Local(CompletionClient::new(local.port)),
        };
        info!(mode = config.mode(), history_window, "backend configured");
        Ok(Self {
            transport,
            history_window,
        })
    }

    /// Override the history window.
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }
}

#[async_trait]
impl ChatBackend for Backend {
    fn history_window(&self) -> usize {
        self.history_window
    }

    async fn generate(
        &self,
        profile: &TutorProfile,
        turns: &[Turn],
    ) -> Result<String, BackendError> {
        match &self.transport {
            Transport::Remote(client) => {
                let context = encoder::encode(PromptStyle::RolePrefix, profile, turns);
                debug!(len = context.len(), "encoded remote context");
                let body = client.post(&GenerateRequest { prompt: &context }).await?;
                extract_field(&body, "text")
            }
            Transport::Local(client) => {
                let context = encoder::encode(PromptStyle::ChatML, profile, turns);
                debug!(len = context.len(), "encoded local context");
                let body = client.complete(&context).await?;
                extract_field(&body, "content")
            }
        }
    }
}

/// Pull a string field out of a backend response envelope.
///
/// Tolerates any surrounding shape as long as the named field is a
/// top-level string. Never panics on unexpected bodies.
fn extract_field(body: &str, field: &str) -> Result<String, BackendError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| BackendError::ResponseParse(format!("response is not valid JSON: {e}")))?;

    value
        .get(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            BackendError::ResponseParse(format!("response has no string field \"{field}\""))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingo_chat::Role;
    use lingo_local::ServerConfig;
    use std::path::PathBuf;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_generate_local_round_trip() {
        // Scripted llama-server: accept one connection, answer a canned
        // completion, close (Connection: close semantics).
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut data = Vec::new();
            let mut buf = [0u8; 4096];
            // The JSON body is the last thing framed, so read until its
            // closing quote-brace arrives.
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                data.extend_from_slice(&buf[..n]);
                if n == 0 || data.ends_with(b"\"}") {
                    break;
                }
            }
            let request = String::from_utf8_lossy(&data).to_string();
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n{\"content\": \"Muy bien\"}",
                )
                .await
                .unwrap();
            request
        });

        let config = BackendConfig::Local(ServerConfig {
            executable: PathBuf::from("/opt/llama-server"),
            model: PathBuf::from("/opt/model.gguf"),
            context_length: 2048,
            port,
            extra_args: vec![],
        });
        let backend = Backend::from_config(&config).unwrap();
        assert_eq!(backend.history_window(), 1);

        let profile = TutorProfile {
            language: "Spanish".to_string(),
            level: "beginner".to_string(),
            topic: "greetings".to_string(),
        };
        let turns = vec![Turn {
            session_id: 1,
            role: Role::User,
            content: "hola".to_string(),
            timestamp: "2024-01-01 00:00:00".to_string(),
        }];

        let reply = backend.generate(&profile, &turns).await.unwrap();
        assert_eq!(reply, "Muy bien");

        // The local arm frames a hand-rolled POST with the ChatML context.
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /completion HTTP/1.1"));
        assert!(request.contains("Connection: close"));
        assert!(request.contains("<|im_start|>user"));
    }

    #[test]
    fn test_extract_content_field() {
        let text = extract_field(r#"{"content": "X"}"#, "content").unwrap();
        assert_eq!(text, "X");
    }

    #[test]
    fn test_extract_text_with_extra_envelope() {
        let body = r#"{"text": "hola", "model": "m", "usage": {"tokens": 5}}"#;
        assert_eq!(extract_field(body, "text").unwrap(), "hola");
    }

    #[test]
    fn test_extract_missing_field() {
        let err = extract_field(r#"{"other": "X"}"#, "content").unwrap_err();
        assert!(matches!(err, BackendError::ResponseParse(_)));
    }

    #[test]
    fn test_extract_non_string_field() {
        let err = extract_field(r#"{"content": 42}"#, "content").unwrap_err();
        assert!(matches!(err, BackendError::ResponseParse(_)));
    }

    #[test]
    fn test_extract_invalid_json() {
        let err = extract_field("<html>oops</html>", "content").unwrap_err();
        assert!(matches!(err, BackendError::ResponseParse(_)));
    }
}
