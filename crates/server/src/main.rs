//! cvetrack-server entry point.
//!
//! Opens the record database, then serves the HTTP API until ctrl-c.
//! Logs are JSON on stderr.

use anyhow::{Context, Result};
use cvetrack_core::{AppConfig, Db, TableStore};
use cvetrack_server::{AppState, run};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(db_path = %config.db_path.display(), bind = %config.bind, "starting cvetrack server");

    let db = Db::open(&config.db_path)
        .await
        .with_context(|| format!("opening record database at {}", config.db_path.display()))?;
    let state = AppState::new(TableStore::new(db));

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;

    run(listener, state, shutdown_signal()).await?;

    tracing::info!("cvetrack server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for ctrl-c; shutting down");
    }
}
