//! Background sync agent.
//!
//! Drains the outbox when a sync trigger fires: every pending submission is
//! POSTed to the submission endpoint and deleted on success. A failed
//! delivery stays queued for the next trigger, so delivery is at-least-once
//! and the endpoint must tolerate duplicates. The periodic trigger also
//! sweeps stale cache partitions as a second line of defense behind the
//! activation-time purge.

use std::sync::Arc;

use squall_core::{CacheStorage, Error, OutboxDb, PartitionRegistry};
use url::Url;

use crate::fetch::FetchClient;

/// Tag for the one-shot sync trigger.
pub const OUTBOX_SYNC_TAG: &str = "outbox-sync";

/// Tag for the periodic trigger (drain + partition sweep).
pub const PERIODIC_SYNC_TAG: &str = "periodic-refresh";

/// Result of one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Submissions delivered and removed from the outbox.
    pub delivered: usize,
    /// Submissions left queued for the next trigger.
    pub retained: usize,
}

/// Drains the outbox and sweeps stale partitions.
pub struct SyncAgent {
    outbox: OutboxDb,
    client: Arc<FetchClient>,
    endpoint: Url,
    storage: CacheStorage,
    registry: PartitionRegistry,
}

impl SyncAgent {
    /// Build a sync agent around shared collaborators.
    pub fn new(
        outbox: OutboxDb, client: Arc<FetchClient>, endpoint: Url, storage: CacheStorage, registry: PartitionRegistry,
    ) -> Self {
        Self { outbox, client, endpoint, storage, registry }
    }

    /// The endpoint queued submissions are delivered to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The outbox this agent drains.
    pub fn outbox(&self) -> &OutboxDb {
        &self.outbox
    }

    /// Deliver every pending submission.
    ///
    /// Iteration order over pending records is unspecified. Any HTTP
    /// response counts as delivered; a network-level failure (or a storage
    /// failure while deleting) retains the record for the next trigger.
    pub async fn drain(&self) -> Result<DrainReport, Error> {
        let pending = self.outbox.list_all().await?;
        let mut report = DrainReport::default();

        for submission in pending {
            match self.client.post_json(&self.endpoint, &submission.payload).await {
                Ok(status) => {
                    tracing::info!(id = %submission.id, status = status.as_u16(), "submission delivered");
                    match self.outbox.remove_by_id(&submission.id).await {
                        Ok(()) => report.delivered += 1,
                        Err(e) => {
                            tracing::warn!(id = %submission.id, error = %e, "delivered but not removed, will redeliver");
                            report.retained += 1;
                        }
                    }
                }
                Err(e) => {
                    tracing::debug!(id = %submission.id, error = %e, "delivery failed, keeping queued");
                    report.retained += 1;
                }
            }
        }

        if report.delivered > 0 || report.retained > 0 {
            tracing::info!(delivered = report.delivered, retained = report.retained, "outbox drain finished");
        }

        Ok(report)
    }

    /// Purge partitions from prior generations.
    ///
    /// Independent of the activation-time purge; stale partitions can
    /// accumulate if activation was interrupted.
    pub async fn sweep_partitions(&self) -> Vec<String> {
        let purged = self.storage.purge_unlisted(&self.registry).await;
        if !purged.is_empty() {
            tracing::info!(count = purged.len(), "periodic sweep purged stale partitions");
        }
        purged
    }
}
