//! HTTP client for backend submission and health probes.
//!
//! Thin reqwest wrapper that owns timeout and user-agent configuration
//! and maps transport failures into the relay error taxonomy. Response
//! classification (which statuses count as success) belongs to the
//! callers; this layer only reports what the backend said.

use std::time::Duration;

use relay_core::{RelayError, Result};
use tracing::{debug, warn};

/// Header carrying the shared auth secret.
pub const AUTH_HEADER: &str = "X-Auth-Key";

/// Configuration for the outbound HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Timeout applied to every request.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30), user_agent: "otp-relay/0.1".to_string() }
    }
}

/// What the backend answered, regardless of whether the caller treats
/// it as success.
#[derive(Debug, Clone)]
pub struct ForwardResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, truncated for logging.
    pub body: String,
}

/// HTTP client for talking to the configured backend.
#[derive(Debug, Clone)]
pub struct ForwardClient {
    client: reqwest::Client,
}

impl ForwardClient {
    /// Creates a client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Configuration` if the underlying HTTP client
    /// cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| RelayError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Creates a client with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(&ClientConfig::default())
    }

    /// POSTs a payload to the submission endpoint.
    pub async fn post(
        &self,
        url: &str,
        auth_key: &str,
        content_type: &str,
        body: String,
    ) -> Result<ForwardResponse> {
        let request = self
            .client
            .post(url)
            .header(AUTH_HEADER, auth_key)
            .header("Content-Type", content_type)
            .body(body);

        let response = request.send().await.map_err(map_transport_error)?;
        Self::capture(response).await
    }

    /// GETs the backend base endpoint for a health probe.
    pub async fn get(&self, url: &str) -> Result<ForwardResponse> {
        let response = self.client.get(url).send().await.map_err(map_transport_error)?;
        Self::capture(response).await
    }

    async fn capture(response: reqwest::Response) -> Result<ForwardResponse> {
        const MAX_BODY: usize = 1024;

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(mut text) => {
                if text.len() > MAX_BODY {
                    text.truncate(MAX_BODY);
                    text.push_str("... (truncated)");
                }
                text
            },
            Err(e) => {
                warn!("failed to read response body: {e}");
                String::new()
            },
        };

        debug!(status, "backend responded");
        Ok(ForwardResponse { status, body })
    }
}

fn map_transport_error(error: reqwest::Error) -> RelayError {
    if error.is_timeout() {
        RelayError::transport("request timed out")
    } else if error.is_connect() {
        RelayError::transport(format!("connection failed: {error}"))
    } else {
        RelayError::transport(error.to_string())
    }
}
