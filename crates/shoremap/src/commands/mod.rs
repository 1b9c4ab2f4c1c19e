//! Command handlers, one module per top-level subcommand.

pub mod config_cmd;
pub mod prefetch;
pub mod recipes;
pub mod simulate;
pub mod weather;

use shoremap_api::{ProxyClient, TransportConfig};
use shoremap_core::CoreError;

use crate::cli::Command;
use crate::config::Resolved;
use crate::error::CliError;

/// Route a command that needs resolved configuration.
pub async fn dispatch(cmd: Command, resolved: &Resolved) -> Result<(), CliError> {
    match cmd {
        Command::Recipes(args) => recipes::handle(args, resolved),
        Command::Simulate(args) => simulate::handle(args, resolved).await,
        Command::Prefetch => prefetch::handle(resolved).await,
        Command::Weather { location } => weather::handle(&location, resolved).await,
        // Handled before configuration is resolved.
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}

/// HTTP client for the configured proxies.
pub(crate) fn proxy_client(resolved: &Resolved) -> Result<ProxyClient, CliError> {
    let transport = TransportConfig::default().with_timeout(resolved.app.api.timeout);
    ProxyClient::new(resolved.app.api.base_url.clone(), &transport)
        .map_err(|e| CliError::from(CoreError::from(e)))
}
