//! Login configuration (layered: flags > env > `.env` file > defaults).

use bon::Builder;
use reqwest::Url;

use crate::error::{LoginError, Result};

/// Scope requested when `AUTH0_SCOPE` is not set.
pub const DEFAULT_SCOPE: &str = "openid email offline_access";

/// Environment variables read by [`LoginConfig::from_env`].
pub const ENV_VARS: [&str; 8] = [
    "AUTH0_DOMAIN",
    "AUTH0_AUDIENCE",
    "AUTH0_SCOPE",
    "AUTH0_CLIENT_ID",
    "ISSUER",
    "CLIENT_ID",
    "SCOPE",
    "AUDIENCE",
];

/// Resolved settings for one login run.
///
/// # Example
/// ```
/// use oidc_device_login::config::LoginConfig;
///
/// let config = LoginConfig::builder()
///     .issuer("https://example.auth0.com/".parse().unwrap())
///     .client_id("my-client")
///     .scope("openid offline_access")
///     .audience("https://api.example.com")
///     .build();
/// assert!(config.wants_offline_access());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct LoginConfig {
    pub issuer: Url,
    #[builder(into)]
    pub client_id: String,
    #[builder(into)]
    pub scope: String,
    #[builder(into)]
    pub audience: String,
}

/// Values supplied on the command line; each one wins over the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub issuer: Option<String>,
    pub client_id: Option<String>,
    pub scope: Option<String>,
    pub audience: Option<String>,
}

impl LoginConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env(overrides: &ConfigOverrides) -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok(), overrides)
    }

    /// Resolve configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F, overrides: &ConfigOverrides) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let flag = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());

        let domain = var("AUTH0_DOMAIN");
        let auth0_audience = var("AUTH0_AUDIENCE");

        // Required even when flags override the values derived from them.
        let mut missing = Vec::new();
        if domain.is_none() {
            missing.push("AUTH0_DOMAIN");
        }
        if auth0_audience.is_none() {
            missing.push("AUTH0_AUDIENCE");
        }
        if !missing.is_empty() {
            return Err(LoginError::configuration(format!(
                "{} must be defined in your environment",
                missing.join(" and ")
            )));
        }

        let issuer_text = flag(&overrides.issuer)
            .or_else(|| var("ISSUER"))
            .or_else(|| domain.as_deref().map(issuer_from_domain))
            .ok_or_else(|| LoginError::configuration("AUTH0_DOMAIN must be defined"))?;
        let issuer = Url::parse(&issuer_text).map_err(|e| {
            LoginError::configuration(format!("invalid issuer URL '{issuer_text}': {e}"))
        })?;

        let client_id = flag(&overrides.client_id)
            .or_else(|| var("CLIENT_ID"))
            .or_else(|| var("AUTH0_CLIENT_ID"))
            .or_else(|| domain.clone())
            .ok_or_else(|| LoginError::configuration("no client id could be resolved"))?;

        let scope = flag(&overrides.scope)
            .or_else(|| var("SCOPE"))
            .or_else(|| var("AUTH0_SCOPE"))
            .unwrap_or_else(|| DEFAULT_SCOPE.to_string());

        let audience = flag(&overrides.audience)
            .or_else(|| var("AUDIENCE"))
            .or(auth0_audience)
            .ok_or_else(|| LoginError::configuration("AUTH0_AUDIENCE must be defined"))?;

        Ok(Self {
            issuer,
            client_id,
            scope,
            audience,
        })
    }

    /// Whether the requested scope asks for a refresh token.
    pub fn wants_offline_access(&self) -> bool {
        scope_has_offline_access(&self.scope)
    }
}

/// `offline_access` must appear as a whole space-separated scope token.
pub fn scope_has_offline_access(scope: &str) -> bool {
    scope.split_whitespace().any(|s| s == "offline_access")
}

fn issuer_from_domain(domain: &str) -> String {
    let domain = domain.trim();
    if domain.starts_with("https://") || domain.starts_with("http://") {
        domain.to_string()
    } else {
        format!("https://{domain}")
    }
}
