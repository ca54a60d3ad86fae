//! Command-line interface.

pub mod login;

use std::io::IsTerminal;

use clap::Parser;

use crate::config::ConfigOverrides;
use crate::presenter::TerminalPresenter;

/// Log in with the OAuth 2.0 Device Authorization Grant and print the access token.
///
/// Settings come from AUTH0_DOMAIN, AUTH0_AUDIENCE and AUTH0_SCOPE (a `.env`
/// file is read if present); the flags below override them.
#[derive(Parser, Debug, Default)]
#[command(name = "oidc-device-login", version)]
pub struct Cli {
    /// Issuer URL (default: https://$AUTH0_DOMAIN)
    #[arg(long)]
    pub issuer: Option<String>,

    /// OAuth client id (default: $AUTH0_CLIENT_ID, else the domain)
    #[arg(long)]
    pub client_id: Option<String>,

    /// API audience (default: $AUTH0_AUDIENCE)
    #[arg(long)]
    pub audience: Option<String>,

    /// Requested scope (default: $AUTH0_SCOPE or "openid email offline_access")
    #[arg(long)]
    pub scope: Option<String>,

    /// Do not draw the QR code
    #[arg(long)]
    pub no_qr: bool,

    /// Print the full token response as JSON
    #[arg(long)]
    pub json: bool,

    /// Log protocol steps to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            issuer: self.issuer.clone(),
            client_id: self.client_id.clone(),
            scope: self.scope.clone(),
            audience: self.audience.clone(),
        }
    }

    pub fn presenter(&self) -> TerminalPresenter {
        TerminalPresenter {
            styled: std::io::stdout().is_terminal(),
            show_qr: !self.no_qr,
            json: self.json,
        }
    }

    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub fn default_log_directive(&self) -> &'static str {
        if self.verbose {
            "oidc_device_login=debug"
        } else {
            "oidc_device_login=warn"
        }
    }
}
