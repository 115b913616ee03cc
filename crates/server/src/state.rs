//! Application state shared across handlers.

use std::sync::Arc;

use squall_core::{AppConfig, OutboxDb};
use squall_worker::OfflineWorker;
use url::Url;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub worker: Arc<OfflineWorker>,
    pub outbox: OutboxDb,
    pub config: Arc<AppConfig>,
    /// Parsed origin inbound paths are resolved against.
    pub origin: Url,
    /// Client for relaying non-intercepted traffic upstream.
    pub relay: reqwest::Client,
}

impl AppState {
    pub fn new(worker: Arc<OfflineWorker>, outbox: OutboxDb, config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let origin = Url::parse(&config.origin)?;
        let relay = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .build()?;
        Ok(Self { worker, outbox, config, origin, relay })
    }
}
