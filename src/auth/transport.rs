//! HTTP capability used by the device flow.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("oidc-device-login/", env!("CARGO_PKG_VERSION"));

/// Failure of a single POST.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The server answered with an OAuth error body.
    #[error("error = {error}; error_description = {}", .description.as_deref().unwrap_or("none"))]
    Protocol {
        error: String,
        description: Option<String>,
    },
    /// Non-success status without a parseable OAuth error body.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("network failure: {0}")]
    Network(String),
    #[error("malformed response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

/// OAuth error body (RFC 6749 §5.2).
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl ErrorResponse {
    fn from_value(value: &Value) -> Option<Self> {
        value.get("error")?.as_str()?;
        serde_json::from_value(value.clone()).ok()
    }
}

/// POSTs a JSON body and returns the decoded JSON reply.
#[async_trait]
pub trait OAuthTransport: Send + Sync {
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, TransportError>;
}

/// [`OAuthTransport`] backed by reqwest.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OAuthTransport for HttpTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, TransportError> {
        let resp = self
            .client
            .post(url)
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .json(body)
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        let parsed = serde_json::from_str::<Value>(&text);

        if let Some(err) = parsed.as_ref().ok().and_then(ErrorResponse::from_value) {
            return Err(TransportError::Protocol {
                error: err.error,
                description: err.error_description,
            });
        }
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        parsed.map_err(|e| TransportError::Decode(e.to_string()))
    }
}
