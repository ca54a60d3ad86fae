//! OAuth 2.0 Device Authorization Grant (RFC 8628) login helper.
//!
//! Requests a device code from an OIDC issuer, shows the user code and a QR
//! code for the verification URL, then polls the token endpoint until the
//! user finishes in a browser.
//!
//! # Quick Start
//!
//! ```no_run
//! use oidc_device_login::auth::{DeviceFlow, HttpDiscovery, HttpTransport, IssuerDiscovery};
//! use oidc_device_login::config::{ConfigOverrides, LoginConfig};
//!
//! # async fn example() -> oidc_device_login::error::Result<()> {
//! let config = LoginConfig::from_env(&ConfigOverrides::default())?;
//! let metadata = HttpDiscovery::new().discover(&config.issuer).await?;
//! let outcome = DeviceFlow::new(HttpTransport::new()).run(&config, &metadata).await?;
//! if let Some(tokens) = outcome.tokens() {
//!     println!("{}", tokens.access_token);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod presenter;
