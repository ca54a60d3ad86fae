//! Login command: config, discovery, device flow, final output.

use tracing::info;

use super::Cli;
use crate::auth::{DeviceFlow, FlowOutcome, HttpDiscovery, HttpTransport, IssuerDiscovery, OAuthTransport};
use crate::config::LoginConfig;
use crate::error::Result;

/// Discover the issuer's endpoints, then run the device flow.
pub async fn run_login<D, T>(
    config: &LoginConfig,
    discovery: &D,
    flow: &DeviceFlow<T>,
) -> Result<FlowOutcome>
where
    D: IssuerDiscovery + ?Sized,
    T: OAuthTransport,
{
    info!(issuer = %config.issuer, client_id = %config.client_id, "discovering issuer");
    let metadata = discovery.discover(&config.issuer).await?;
    flow.run(config, &metadata).await
}

/// Handle a full invocation. Configuration is resolved before any request.
pub async fn handle_login(cli: &Cli) -> Result<FlowOutcome> {
    let config = LoginConfig::from_env(&cli.overrides())?;
    let presenter = cli.presenter();
    println!("{}", presenter.starting());

    let client = reqwest::Client::new();
    let discovery = HttpDiscovery::with_client(client.clone());
    let flow = DeviceFlow::new(HttpTransport::with_client(client)).with_event_sink(presenter.sink());

    let outcome = run_login(&config, &discovery, &flow).await?;
    for line in presenter.render_outcome(&outcome) {
        println!("{line}");
    }
    Ok(outcome)
}
