//! squall gateway entry point.
//!
//! Boots the offline worker (install + activate), schedules the periodic
//! sync trigger, and serves the gateway. Logging goes to stderr as JSON.

use std::sync::Arc;

use anyhow::{Context, Result};
use squall_core::{AppConfig, OutboxDb};
use squall_worker::{OfflineWorker, PERIODIC_SYNC_TAG};
use tracing_subscriber::EnvFilter;

mod routes;
mod state;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    tracing::info!(origin = %config.origin, listen = %config.listen_addr, "starting squall gateway");

    let outbox = OutboxDb::open(&config.db_path)
        .await
        .context("opening outbox database")?;
    let worker = Arc::new(OfflineWorker::new(&config, outbox.clone()).context("building worker")?);

    let installed = worker.install().await.context("installing precache manifest")?;
    let purged = worker.activate().await;
    tracing::info!(installed, purged = purged.len(), "worker ready");

    {
        let worker = Arc::clone(&worker);
        let period = config.sync_interval();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // the first tick completes immediately; skip it
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(e) = worker.handle_periodic_sync(PERIODIC_SYNC_TAG).await {
                    tracing::warn!(error = %e, "periodic sync failed");
                }
            }
        });
    }

    let listen_addr = config.listen_addr.clone();
    let app = routes::create_router(state::AppState::new(worker, outbox, Arc::new(config))?);
    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("binding {listen_addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
}
