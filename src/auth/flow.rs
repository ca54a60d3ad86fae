//! Device flow engine: authorization request, then token polling.
//!
//! ```text
//! Idle -> Requested -> Polling -> { Authorized, Denied, Expired, Failed }
//!                         ^   |
//!                         +---+ authorization_pending / slow_down
//! ```
//!
//! Recognised protocol outcomes come back as [`FlowOutcome`]; only failures
//! outside the device-flow error taxonomy are returned as `Err`.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::device_code::{
    DeviceAuthorizationRequest, DeviceAuthorizationResponse, DeviceCodePoll, DeviceCodeSession,
    SLOW_DOWN_INCREMENT,
};
use super::discovery::IssuerMetadata;
use super::token::TokenSet;
use super::transport::{HttpTransport, OAuthTransport, TransportError};
use crate::config::LoginConfig;
use crate::error::{LoginError, Result};

/// Callback receiving status events as the flow progresses.
pub type FlowEventSink = Arc<dyn Fn(FlowEvent) + Send + Sync>;

/// Why a device code stopped being usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
    /// The server answered `expired_token`.
    Server,
    /// `expires_in` elapsed locally before the server reported anything.
    LocalDeadline,
}

/// Terminal state of a completed flow.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowOutcome {
    Authorized(TokenSet),
    Denied,
    Expired(ExpiryReason),
    Failed {
        error: String,
        description: Option<String>,
    },
}

impl FlowOutcome {
    pub fn tokens(&self) -> Option<&TokenSet> {
        match self {
            Self::Authorized(tokens) => Some(tokens),
            _ => None,
        }
    }

    /// Every outcome is a normal end of the protocol, so the process exits 0.
    pub fn exit_code(&self) -> i32 {
        0
    }
}

/// Status events emitted for the presenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    /// The user code is ready to be shown.
    UserCode {
        verification_uri: String,
        user_code: String,
        qr_payload: String,
        expires_in: Duration,
    },
    PollingStarted {
        interval: Duration,
    },
    Pending {
        attempt: u32,
    },
    SlowDown {
        interval: Duration,
    },
    Authorized,
    Denied,
    Expired {
        reason: ExpiryReason,
    },
    ProtocolError {
        error: String,
        description: Option<String>,
    },
}

/// Drives one device authorization from request to terminal outcome.
pub struct DeviceFlow<T = HttpTransport> {
    transport: T,
    event_sink: Option<FlowEventSink>,
}

impl<T: OAuthTransport> DeviceFlow<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            event_sink: None,
        }
    }

    pub fn with_event_sink(mut self, sink: FlowEventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn emit(&self, event: FlowEvent) {
        if let Some(sink) = &self.event_sink {
            sink(event);
        }
    }

    /// Request a device code and announce the user code.
    pub async fn initiate(
        &self,
        config: &LoginConfig,
        metadata: &IssuerMetadata,
    ) -> Result<DeviceCodeSession> {
        let request = DeviceAuthorizationRequest::from_config(config);
        debug!(
            endpoint = %metadata.device_authorization_endpoint,
            scope = %request.scope,
            consent = request.prompt.is_some(),
            "requesting device authorization"
        );
        let body = serde_json::to_value(&request)?;
        let reply = self
            .transport
            .post_json(&metadata.device_authorization_endpoint, &body)
            .await
            .map_err(LoginError::AuthorizationRequest)?;
        let response: DeviceAuthorizationResponse = serde_json::from_value(reply)
            .map_err(|e| LoginError::AuthorizationRequest(TransportError::Decode(e.to_string())))?;

        let session =
            DeviceCodeSession::from_response(response, &config.client_id, &metadata.token_endpoint);
        info!(
            verification_uri = %session.verification_uri,
            expires_in_secs = session.expires_in.as_secs(),
            "device authorization granted"
        );
        self.emit(FlowEvent::UserCode {
            verification_uri: session.verification_uri.clone(),
            user_code: session.user_code.clone(),
            qr_payload: session.qr_payload().to_string(),
            expires_in: session.expires_in,
        });
        Ok(session)
    }

    /// Send one token request and classify the reply.
    pub async fn poll_once(&self, session: &DeviceCodeSession) -> Result<DeviceCodePoll> {
        let body = serde_json::to_value(session.poll_request())?;
        match self.transport.post_json(&session.token_endpoint, &body).await {
            Ok(reply) => {
                let tokens: TokenSet = serde_json::from_value(reply).map_err(|e| {
                    LoginError::Unexpected(format!("token response is not a token set: {e}"))
                })?;
                Ok(DeviceCodePoll::Authorized { tokens })
            }
            Err(TransportError::Protocol { error, description }) => {
                Ok(DeviceCodePoll::from_error(&error, description))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Poll until the server or the local deadline ends the flow.
    pub async fn poll(&self, session: &DeviceCodeSession) -> Result<FlowOutcome> {
        let mut interval = session.interval;
        let mut attempt: u32 = 0;
        info!(interval_secs = interval.as_secs(), "polling token endpoint");
        self.emit(FlowEvent::PollingStarted { interval });

        loop {
            if session.is_expired() {
                info!("device code expired before authorization completed");
                return Ok(self.finish_expired(ExpiryReason::LocalDeadline));
            }

            attempt += 1;
            debug!(attempt, "polling for token");
            match self.poll_once(session).await? {
                DeviceCodePoll::Authorized { tokens } => {
                    info!(attempt, "authorization complete");
                    self.emit(FlowEvent::Authorized);
                    return Ok(FlowOutcome::Authorized(tokens));
                }
                DeviceCodePoll::Pending => {
                    self.emit(FlowEvent::Pending { attempt });
                }
                DeviceCodePoll::SlowDown => {
                    interval = interval.saturating_add(SLOW_DOWN_INCREMENT);
                    warn!(
                        interval_secs = interval.as_secs(),
                        "server asked to slow down"
                    );
                    self.emit(FlowEvent::SlowDown { interval });
                }
                DeviceCodePoll::AccessDenied => {
                    info!("end-user denied the authorization");
                    self.emit(FlowEvent::Denied);
                    return Ok(FlowOutcome::Denied);
                }
                DeviceCodePoll::Expired => {
                    info!("server reported the device code as expired");
                    return Ok(self.finish_expired(ExpiryReason::Server));
                }
                DeviceCodePoll::ProtocolError { error, description } => {
                    warn!(%error, "token endpoint returned an error");
                    self.emit(FlowEvent::ProtocolError {
                        error: error.clone(),
                        description: description.clone(),
                    });
                    return Ok(FlowOutcome::Failed { error, description });
                }
            }

            let wake = Instant::now()
                .checked_add(interval)
                .map_or(session.deadline, |at| at.min(session.deadline));
            debug!(wait_ms = interval.as_millis() as u64, "waiting before next poll");
            tokio::time::sleep_until(wake).await;
        }
    }

    /// Initiate, then poll to completion.
    pub async fn run(&self, config: &LoginConfig, metadata: &IssuerMetadata) -> Result<FlowOutcome> {
        let session = self.initiate(config, metadata).await?;
        self.poll(&session).await
    }

    fn finish_expired(&self, reason: ExpiryReason) -> FlowOutcome {
        self.emit(FlowEvent::Expired { reason });
        FlowOutcome::Expired(reason)
    }
}
