//! Pledge distribution event indexer — entry point.
//!
//! Starts a background indexer task that polls Soroban `getEvents` RPC for
//! distribution contract events and persists them to SQLite. Simultaneously
//! exposes a small Axum REST API for participants and operators.

mod api;
mod config;
mod db;
mod errors;
mod events;
mod indexer;
mod rpc;
mod xdr;

use std::future::Future;
use std::sync::Arc;

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::Config;
use indexer::IndexerState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    // Set up the SQLite connection pool and run migrations.
    let pool = db::init_pool(&config.database_url).await?;

    let client = Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let shutdown = CancellationToken::new();

    // ─── Background indexer ───────────────────────────────
    let indexer_state = Arc::new(IndexerState {
        pool: pool.clone(),
        config: config.clone(),
        client,
    });
    let indexer_task = tokio::spawn(indexer::run(indexer_state, shutdown.clone()));

    // ─── REST API ─────────────────────────────────────────
    let app = api::router(Arc::new(api::ApiState { pool }));

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(cancel_on(tokio::signal::ctrl_c(), shutdown.clone()))
        .await?;

    shutdown.cancel();
    indexer_task.await?;

    Ok(())
}

/// Cancel `token` once `signal` resolves. A listener that could not be
/// installed is logged and treated as a shutdown request.
async fn cancel_on<F>(signal: F, token: CancellationToken)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => error!("Failed to listen for Ctrl-C, shutting down: {e}"),
    }
    token.cancel();
}
