//! OAuth 2.0 Device Authorization Grant client.

pub mod device_code;
pub mod discovery;
pub mod flow;
pub mod token;
pub mod transport;

pub use device_code::{
    DeviceAuthorizationRequest, DeviceAuthorizationResponse, DeviceCodePoll, DeviceCodeSession,
    PollRequest, TokenErrorCode,
};
pub use discovery::{HttpDiscovery, IssuerDiscovery, IssuerMetadata};
pub use flow::{DeviceFlow, ExpiryReason, FlowEvent, FlowEventSink, FlowOutcome};
pub use token::TokenSet;
pub use transport::{HttpTransport, OAuthTransport, TransportError};
