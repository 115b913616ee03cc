//! Named cache partitions and their lifecycle.
//!
//! `CacheStorage` is an explicitly owned service object: constructed once at
//! startup and passed by handle to the pipeline, the sync agent, and tests.
//! Partitions map normalized request keys to response snapshots. Concurrent
//! operations on different keys interleave freely; two concurrent writers of
//! the same key are last-write-wins, which is acceptable because snapshots
//! for the same key are equivalent.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::registry::PartitionRegistry;
use super::snapshot::ResponseSnapshot;

type Entries = Arc<RwLock<HashMap<String, ResponseSnapshot>>>;

/// The set of named cache partitions.
///
/// Cheaply clonable; clones share the same underlying partitions.
#[derive(Clone, Default)]
pub struct CacheStorage {
    partitions: Arc<RwLock<HashMap<String, Entries>>>,
}

/// Handle to one open partition.
///
/// Holds the partition's entry map directly, so lookups and stores do not
/// touch the partition table again.
#[derive(Clone)]
pub struct PartitionHandle {
    name: String,
    entries: Entries,
}

impl CacheStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a partition by name, creating it if absent.
    pub async fn open(&self, name: &str) -> PartitionHandle {
        let mut partitions = self.partitions.write().await;
        let entries = partitions
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(HashMap::new())))
            .clone();
        PartitionHandle { name: name.to_string(), entries }
    }

    /// Look up a key across all partitions.
    ///
    /// Used by fallback paths that accept a match from any generation.
    pub async fn match_any(&self, key: &str) -> Option<ResponseSnapshot> {
        let partitions = self.partitions.read().await;
        for entries in partitions.values() {
            if let Some(snapshot) = entries.read().await.get(key) {
                return Some(snapshot.clone());
            }
        }
        None
    }

    /// Delete every partition whose name is not in the registry.
    ///
    /// Returns the names of the deleted partitions. Called at activation
    /// and again by the periodic sweep.
    pub async fn purge_unlisted(&self, registry: &PartitionRegistry) -> Vec<String> {
        let mut partitions = self.partitions.write().await;
        let stale: Vec<String> = partitions
            .keys()
            .filter(|name| !registry.contains(name))
            .cloned()
            .collect();

        for name in &stale {
            partitions.remove(name);
            tracing::info!(partition = %name, "purged stale partition");
        }

        stale
    }

    /// Names of all partitions currently present.
    pub async fn partition_names(&self) -> Vec<String> {
        self.partitions.read().await.keys().cloned().collect()
    }
}

impl PartitionHandle {
    /// The partition's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a snapshot, overwriting any prior entry for the key.
    pub async fn put(&self, key: &str, snapshot: ResponseSnapshot) {
        self.entries.write().await.insert(key.to_string(), snapshot);
    }

    /// Look up a snapshot by key.
    pub async fn get(&self, key: &str) -> Option<ResponseSnapshot> {
        self.entries.read().await.get(key).cloned()
    }

    /// Number of entries stored.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the partition has no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
