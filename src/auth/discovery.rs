//! OpenID Connect issuer discovery.

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{LoginError, Result};

const WELL_KNOWN_PATH: &str = ".well-known/openid-configuration";

/// Endpoints the device flow needs from an issuer's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerMetadata {
    pub issuer: String,
    pub token_endpoint: String,
    pub device_authorization_endpoint: String,
}

/// Raw discovery document; every field is optional until validated.
#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    issuer: Option<String>,
    token_endpoint: Option<String>,
    device_authorization_endpoint: Option<String>,
}

/// Resolves issuer metadata for an issuer URL.
#[async_trait]
pub trait IssuerDiscovery: Send + Sync {
    async fn discover(&self, issuer: &Url) -> Result<IssuerMetadata>;
}

/// Discovery over HTTP using the `/.well-known/openid-configuration` document.
#[derive(Debug, Clone, Default)]
pub struct HttpDiscovery {
    client: reqwest::Client,
}

impl HttpDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// `<issuer>/.well-known/openid-configuration`, keeping any issuer path.
pub fn discovery_url(issuer: &Url) -> String {
    format!("{}/{WELL_KNOWN_PATH}", issuer.as_str().trim_end_matches('/'))
}

#[async_trait]
impl IssuerDiscovery for HttpDiscovery {
    async fn discover(&self, issuer: &Url) -> Result<IssuerMetadata> {
        let url = discovery_url(issuer);
        debug!(%url, "fetching issuer metadata");

        let resp = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| LoginError::discovery(issuer.as_str(), e.to_string()))?;
        if !resp.status().is_success() {
            return Err(LoginError::discovery(
                issuer.as_str(),
                format!("discovery document request failed with status {}", resp.status()),
            ));
        }
        let document: DiscoveryDocument = resp
            .json()
            .await
            .map_err(|e| LoginError::discovery(issuer.as_str(), e.to_string()))?;

        metadata_from_document(issuer, document)
    }
}

fn metadata_from_document(issuer: &Url, document: DiscoveryDocument) -> Result<IssuerMetadata> {
    let missing = |field: &str| {
        LoginError::discovery(
            issuer.as_str(),
            format!("metadata does not include {field}"),
        )
    };
    let token_endpoint = document
        .token_endpoint
        .ok_or_else(|| missing("token_endpoint"))?;
    let device_authorization_endpoint = document
        .device_authorization_endpoint
        .ok_or_else(|| missing("device_authorization_endpoint"))?;

    let configured = issuer.as_str().trim_end_matches('/');
    let issuer_name = match document.issuer {
        Some(reported) => {
            if reported.trim_end_matches('/') != configured {
                warn!(%reported, configured, "issuer in metadata differs from configured issuer");
            }
            reported
        }
        None => issuer.to_string(),
    };

    Ok(IssuerMetadata {
        issuer: issuer_name,
        token_endpoint,
        device_authorization_endpoint,
    })
}
