//! Minimal hand-rolled HTTP/1.1 client for the local inference server.
//!
//! The server speaks `Connection: close` semantics: one request per TCP
//! connection, response read until the peer closes. That makes the framing
//! trivial (no keep-alive, no chunked parsing) and is acceptable because
//! request volume is one per user turn. The whole client sits behind
//! [`CompletionClient`] so it could be swapped for a real HTTP library
//! without touching the dispatcher.

use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::error::LocalError;

/// Default connect timeout for the loopback socket.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default read timeout. Generation on CPU can be slow, so this is generous.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(180);

/// Request body for the server's `/completion` endpoint.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
}

/// One-shot HTTP client for a llama-server instance on the loopback address.
pub struct CompletionClient {
    port: u16,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl CompletionClient {
    /// Create a client for `127.0.0.1:{port}` with default timeouts.
    pub fn new(port: u16) -> Self {
        Self {
            port,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Override both timeouts.
    pub fn with_timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }

    /// The port this client targets.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// POST the prompt to `/completion` and return the raw response body.
    ///
    /// The body is expected to be JSON with a `"content"` field; extracting
    /// it is the dispatcher's job, not the transport's.
    pub async fn complete(&self, prompt: &str) -> Result<String, LocalError> {
        let body = serde_json::to_string(&CompletionRequest { prompt })?;
        let request = format!(
            "POST /completion HTTP/1.1\r\n\
             Host: 127.0.0.1\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n{}",
            body.len(),
            body
        );

        let (_, body) = self.round_trip(&request).await?;
        Ok(body)
    }

    /// GET `/health` and report whether the server answered 200.
    ///
    /// llama-server replies 503 while the model is still loading, so a
    /// non-200 answer means "up but not ready yet".
    pub async fn check_health(&self) -> Result<bool, LocalError> {
        let request = "GET /health HTTP/1.1\r\n\
                       Host: 127.0.0.1\r\n\
                       Connection: close\r\n\r\n";
        let (head, _) = self.round_trip(request).await?;
        Ok(status_code(&head) == Some(200))
    }

    /// Write one request and read the response to EOF.
    async fn round_trip(&self, request: &str) -> Result<(String, String), LocalError> {
        let addr = format!("127.0.0.1:{}", self.port);

        let resolved = lookup_host(addr.as_str())
            .await
            .map_err(|e| LocalError::Connect {
                addr: addr.clone(),
                reason: e.to_string(),
            })?
            .next()
            .ok_or_else(|| LocalError::Connect {
                addr: addr.clone(),
                reason: "address resolution returned no results".to_string(),
            })?;

        let mut stream = timeout(self.connect_timeout, TcpStream::connect(resolved))
            .await
            .map_err(|_| LocalError::Timeout(self.connect_timeout))?
            .map_err(|e| LocalError::Connect {
                addr: addr.clone(),
                reason: e.to_string(),
            })?;

        trace!(%addr, len = request.len(), "sending request");
        stream.write_all(request.as_bytes()).await?;

        let mut raw = Vec::new();
        timeout(self.read_timeout, stream.read_to_end(&mut raw))
            .await
            .map_err(|_| LocalError::Timeout(self.read_timeout))??;
        debug!(%addr, len = raw.len(), "response received");

        split_response(&raw)
    }
}

/// Split a raw HTTP response at the blank-line boundary.
///
/// Returns `(head, body)`. Fails with [`LocalError::MalformedResponse`] when
/// no boundary exists or either half is not valid UTF-8.
pub(crate) fn split_response(raw: &[u8]) -> Result<(String, String), LocalError> {
    let boundary = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .ok_or_else(|| {
            LocalError::MalformedResponse("no header/body boundary found".to_string())
        })?;

    let head = std::str::from_utf8(&raw[..boundary])
        .map_err(|_| LocalError::MalformedResponse("headers are not valid UTF-8".to_string()))?;
    let body = std::str::from_utf8(&raw[boundary + 4..])
        .map_err(|_| LocalError::MalformedResponse("body is not valid UTF-8".to_string()))?;

    Ok((head.to_string(), body.to_string()))
}

/// Parse the numeric status out of a response head, if present.
pub(crate) fn status_code(head: &str) -> Option<u16> {
    head.lines()
        .next()?
        .split_whitespace()
        .nth(1)?
        .parse()
        .ok()
}
