mod clock;
mod config;
mod resp;
mod server;
mod store;

use anyhow::Context;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{config::ServerConfig, store::Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = ServerConfig::default();
    let store = Store::new();
    let _sweeper = server::spawn_expiry_sweeper(store.clone(), config.sweep_interval);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Unable to listen on {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);

    tokio::select! {
        _ = server::listen(listener, store, config) => {},
        result = signal::ctrl_c() => {
            result.context("Unable to listen for shutdown signal")?;
            info!("Shutdown signal received, stopping server");
        },
    }

    Ok(())
}
