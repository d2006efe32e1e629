//! Cache Refresher - Headless Daemon
//!
//! Receives "generation ended" events from the host over HTTP and keeps the
//! upstream prompt cache warm by replaying the last request on a timer.
//!
//! Control API at: http://localhost:8046/api/

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

mod api;
mod cli;
mod commands;
mod logging;
mod router;
mod state;
#[cfg(test)]
mod test_helpers;

use cache_refresher_core::transport::{build_http_client, resolve_base_url, ChatCompletionTransport};
use cache_refresher_core::SettingsStore;
use cli::{Cli, Commands};
use logging::LogControl;
use state::AppState;

/// Upper bound for one replayed request, in seconds.
const UPSTREAM_TIMEOUT_SECS: u64 = 60;

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    match cli.command.take() {
        None | Some(Commands::Serve) => serve(cli).await,
        Some(Commands::Status { json }) => commands::handle_status(cli.port, json).await,
        Some(Commands::Config(cmd)) => commands::handle_config_command(cmd),
    }
}

async fn serve(cli: Cli) -> Result<()> {
    let log = LogControl::init(&cli.log_level)?;

    info!("Cache Refresher starting on port {}...", cli.port);

    let store = SettingsStore::open_default()?;
    info!("[Settings] Using {}", store.path().display());

    let client = build_http_client(UPSTREAM_TIMEOUT_SECS)?;
    let base_url = resolve_base_url(cli.upstream_url);
    let transport = Arc::new(ChatCompletionTransport::new(client, base_url, cli.api_key));
    info!("[Transport] Refreshing against {}", transport.base_url());

    let state = AppState::new_with_components(store, transport, log)?;
    let app = router::build_router(state.clone());

    let addr = SocketAddr::from(([127, 0, 0, 1], cli.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API available at http://{}/api/", addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    state.scheduler().shutdown();
    info!("Cache Refresher stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
