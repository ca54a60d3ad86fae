//! Error types for the device login helper.

use thiserror::Error;

use crate::auth::transport::TransportError;

/// Failures that abort a login run.
///
/// Recognised protocol outcomes (denied, expired, named OAuth errors) are
/// not represented here; they are [`FlowOutcome`](crate::auth::FlowOutcome)
/// values. Everything in this enum ends the process with exit code 1.
#[derive(Error, Debug)]
pub enum LoginError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Discovery failed for {issuer}: {message}")]
    Discovery { issuer: String, message: String },

    #[error("Device authorization request failed: {0}")]
    AuthorizationRequest(#[source] TransportError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LoginError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn discovery(issuer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Discovery {
            issuer: issuer.into(),
            message: message.into(),
        }
    }

    /// Whether the failure happened before any network traffic.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

impl From<TransportError> for LoginError {
    fn from(error: TransportError) -> Self {
        Self::Unexpected(error.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, LoginError>;
