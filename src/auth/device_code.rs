//! Device Authorization Grant wire types and poll classification.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::EnumString;
use tokio::time::Instant;

use super::TokenSet;
use crate::config::{scope_has_offline_access, LoginConfig};

/// `grant_type` value for device-code token requests.
pub const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Re-authentication freshness bound sent with every authorization request.
pub const MAX_AGE_SECS: u64 = 300;

/// Poll interval used when the server suggests nothing longer.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Increment applied to the poll interval after a `slow_down` response.
pub const SLOW_DOWN_INCREMENT: Duration = Duration::from_secs(5);

/// Upper bound on how far ahead a session deadline is placed.
const MAX_SESSION_LIFETIME: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Body of the request sent to the device-authorization endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceAuthorizationRequest {
    pub client_id: String,
    pub scope: String,
    pub audience: String,
    pub max_age: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl DeviceAuthorizationRequest {
    /// `prompt=consent` is added whenever the scope includes `offline_access`,
    /// so a refresh token is issued even for users who consented before.
    pub fn new(
        client_id: impl Into<String>,
        scope: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        let scope = scope.into();
        let prompt = scope_has_offline_access(&scope).then(|| "consent".to_string());
        Self {
            client_id: client_id.into(),
            scope,
            audience: audience.into(),
            max_age: MAX_AGE_SECS,
            prompt,
        }
    }

    pub fn from_config(config: &LoginConfig) -> Self {
        Self::new(&config.client_id, &config.scope, &config.audience)
    }
}

/// Device-authorization endpoint response (RFC 8628 §3.2).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceAuthorizationResponse {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    #[serde(default)]
    pub verification_uri_complete: Option<String>,
    pub expires_in: u64,
    #[serde(default)]
    pub interval: Option<u64>,
}

/// Body of each token-endpoint poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollRequest {
    pub grant_type: &'static str,
    pub client_id: String,
    pub device_code: String,
}

impl PollRequest {
    pub fn new(client_id: impl Into<String>, device_code: impl Into<String>) -> Self {
        Self {
            grant_type: DEVICE_CODE_GRANT_TYPE,
            client_id: client_id.into(),
            device_code: device_code.into(),
        }
    }
}

/// An authorization in progress: what the user needs to see plus the polling
/// state. The device code is kept out of `Debug` output.
#[derive(Clone)]
pub struct DeviceCodeSession {
    pub client_id: String,
    pub token_endpoint: String,
    pub verification_uri: String,
    pub verification_uri_complete: Option<String>,
    pub user_code: String,
    pub device_code: String,
    pub interval: Duration,
    pub expires_in: Duration,
    pub deadline: Instant,
}

impl std::fmt::Debug for DeviceCodeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceCodeSession")
            .field("client_id", &self.client_id)
            .field("token_endpoint", &self.token_endpoint)
            .field("verification_uri", &self.verification_uri)
            .field("verification_uri_complete", &self.verification_uri_complete)
            .field("user_code", &self.user_code)
            .field("device_code", &"..")
            .field("interval", &self.interval)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

impl DeviceCodeSession {
    /// Build a session from the server response, starting the expiry clock now.
    pub fn from_response(
        response: DeviceAuthorizationResponse,
        client_id: impl Into<String>,
        token_endpoint: impl Into<String>,
    ) -> Self {
        let interval = response
            .interval
            .map(Duration::from_secs)
            .map_or(DEFAULT_POLL_INTERVAL, |i| i.max(DEFAULT_POLL_INTERVAL));
        let expires_in = Duration::from_secs(response.expires_in);
        Self {
            client_id: client_id.into(),
            token_endpoint: token_endpoint.into(),
            verification_uri: response.verification_uri,
            verification_uri_complete: response.verification_uri_complete,
            user_code: response.user_code,
            device_code: response.device_code,
            interval,
            expires_in,
            deadline: Instant::now() + expires_in.min(MAX_SESSION_LIFETIME),
        }
    }

    /// URL encoded into the QR code; falls back to the bare verification URI.
    pub fn qr_payload(&self) -> &str {
        self.verification_uri_complete
            .as_deref()
            .unwrap_or(&self.verification_uri)
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub fn poll_request(&self) -> PollRequest {
        PollRequest::new(&self.client_id, &self.device_code)
    }
}

/// Error codes a token endpoint may return while a device code is live.
#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum TokenErrorCode {
    AuthorizationPending,
    SlowDown,
    AccessDenied,
    ExpiredToken,
    /// Any other code from the OAuth/OIDC error registry.
    #[strum(default)]
    Other(String),
}

impl TokenErrorCode {
    pub fn parse(code: &str) -> Self {
        // `Other` is the strum default, so parsing never fails.
        code.parse()
            .unwrap_or_else(|_| Self::Other(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::AuthorizationPending => "authorization_pending",
            Self::SlowDown => "slow_down",
            Self::AccessDenied => "access_denied",
            Self::ExpiredToken => "expired_token",
            Self::Other(code) => code,
        }
    }
}

impl std::fmt::Display for TokenErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single token-endpoint poll.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCodePoll {
    Authorized {
        tokens: TokenSet,
    },
    Pending,
    SlowDown,
    AccessDenied,
    Expired,
    ProtocolError {
        error: String,
        description: Option<String>,
    },
}

impl DeviceCodePoll {
    /// Classify a structured OAuth error body.
    pub fn from_error(error: &str, description: Option<String>) -> Self {
        match TokenErrorCode::parse(error) {
            TokenErrorCode::AuthorizationPending => Self::Pending,
            TokenErrorCode::SlowDown => Self::SlowDown,
            TokenErrorCode::AccessDenied => Self::AccessDenied,
            TokenErrorCode::ExpiredToken => Self::Expired,
            TokenErrorCode::Other(error) => Self::ProtocolError { error, description },
        }
    }
}
