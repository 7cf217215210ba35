//! HTTPS client for the remote inference endpoint.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use tracing::debug;

use crate::config::RemoteConfig;
use crate::error::BackendError;

/// Completion path on the remote endpoint.
const COMPLETIONS_PATH: &str = "/v1/completions";

/// Connect timeout for the TLS handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Total request deadline. Bounds a stalled remote so the single thread of
/// control is never blocked indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for the remote HTTPS backend. One POST per user turn; no pooling
/// concerns worth tuning at that volume.
#[derive(Debug)]
pub struct RemoteClient {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteClient {
    /// Build a client from the remote configuration.
    pub fn new(config: &RemoteConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| BackendError::Config("api_key contains invalid characters".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: format!("https://{}:{}", config.host, config.port),
        })
    }

    /// The endpoint this client posts to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body and return the raw response body.
    pub async fn post<T: Serialize>(&self, body: &T) -> Result<String, BackendError> {
        let url = format!("{}{}", self.base_url, COMPLETIONS_PATH);
        debug!(%url, "posting completion request");

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(BackendError::Http {
                status: status.as_u16(),
                message: text,
            });
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        let config = RemoteConfig {
            host: "inference.example.com".to_string(),
            port: 8443,
            api_key: "sk-test".to_string(),
        };
        let client = RemoteClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "https://inference.example.com:8443");
    }

    #[test]
    fn test_invalid_api_key_rejected() {
        let config = RemoteConfig {
            host: "inference.example.com".to_string(),
            port: 443,
            api_key: "bad\nkey".to_string(),
        };
        let err = RemoteClient::new(&config).unwrap_err();
        assert!(matches!(err, BackendError::Config(_)));
    }
}
