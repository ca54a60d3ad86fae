#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use oidc_device_login::auth::{FlowEvent, FlowEventSink, IssuerMetadata, OAuthTransport, TransportError};
use oidc_device_login::config::LoginConfig;
use serde_json::{json, Value};
use tokio::time::Instant;

/// One request seen by [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub body: Value,
    pub at: Instant,
}

/// Transport that replays canned replies in order and records every call.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<Value, TransportError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<Value, TransportError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    pub fn calls_to(&self, url: &str) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.url == url).collect()
    }
}

#[async_trait]
impl OAuthTransport for ScriptedTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, TransportError> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(RecordedCall {
                url: url.to_string(),
                body: body.clone(),
                at: Instant::now(),
            });
        self.replies
            .lock()
            .expect("replies lock poisoned")
            .pop_front()
            .expect("transport script exhausted")
    }
}

/// Collects emitted events for later assertions.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<FlowEvent>>>,
}

impl EventLog {
    pub fn sink(&self) -> FlowEventSink {
        let events = self.events.clone();
        Arc::new(move |event: FlowEvent| events.lock().expect("events lock poisoned").push(event))
    }

    pub fn events(&self) -> Vec<FlowEvent> {
        self.events.lock().expect("events lock poisoned").clone()
    }

    pub fn pending_attempts(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                FlowEvent::Pending { attempt } => Some(attempt),
                _ => None,
            })
            .collect()
    }
}

pub const DEVICE_ENDPOINT: &str = "https://tenant.auth0.com/oauth/device/code";
pub const TOKEN_ENDPOINT: &str = "https://tenant.auth0.com/oauth/token";

pub fn config(scope: &str) -> LoginConfig {
    LoginConfig::builder()
        .issuer("https://tenant.auth0.com/".parse().expect("issuer url"))
        .client_id("client-123")
        .scope(scope)
        .audience("https://api.example.com")
        .build()
}

pub fn metadata() -> IssuerMetadata {
    IssuerMetadata {
        issuer: "https://tenant.auth0.com/".to_string(),
        token_endpoint: TOKEN_ENDPOINT.to_string(),
        device_authorization_endpoint: DEVICE_ENDPOINT.to_string(),
    }
}

pub fn device_authorization(expires_in: u64) -> Result<Value, TransportError> {
    device_authorization_with_interval(expires_in, 5)
}

pub fn device_authorization_with_interval(
    expires_in: u64,
    interval: u64,
) -> Result<Value, TransportError> {
    Ok(json!({
        "device_code": "dev-code-1",
        "user_code": "ABCD-EFGH",
        "verification_uri": "https://tenant.auth0.com/activate",
        "verification_uri_complete": "https://tenant.auth0.com/activate?user_code=ABCD-EFGH",
        "expires_in": expires_in,
        "interval": interval
    }))
}

pub fn oauth_error(code: &str) -> Result<Value, TransportError> {
    Err(TransportError::Protocol {
        error: code.to_string(),
        description: None,
    })
}

pub fn tokens(access_token: &str) -> Result<Value, TransportError> {
    Ok(json!({
        "access_token": access_token,
        "refresh_token": "refresh-1",
        "token_type": "Bearer",
        "expires_in": 86400,
        "scope": "openid email offline_access"
    }))
}
