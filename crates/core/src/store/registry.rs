//! Partition kinds and the generation registry.
//!
//! Partition names embed the cache generation (`squall-<kind>-v<N>`), so
//! deciding whether a partition is current is an exact name comparison
//! against the registry. No content inspection is ever needed.

/// The fixed set of partition kinds, one per resource class grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionKind {
    /// Critical resources populated at install time.
    Precache,
    /// Web fonts, own or from trusted CDNs.
    Fonts,
    /// Images, own or from trusted CDNs.
    Images,
    /// Navigations, scripts, styles, and everything uncategorized.
    Runtime,
    /// API responses (status-gated).
    Api,
}

impl PartitionKind {
    /// All kinds, in registry order.
    pub const ALL: [PartitionKind; 5] = [
        PartitionKind::Precache,
        PartitionKind::Fonts,
        PartitionKind::Images,
        PartitionKind::Runtime,
        PartitionKind::Api,
    ];

    fn slug(self) -> &'static str {
        match self {
            PartitionKind::Precache => "precache",
            PartitionKind::Fonts => "fonts",
            PartitionKind::Images => "images",
            PartitionKind::Runtime => "runtime",
            PartitionKind::Api => "api",
        }
    }
}

/// The process-wide list of currently valid partition names.
///
/// Built once from the configured generation, immutable between
/// activations. Partitions whose names are not listed here are stale
/// generations and get purged.
#[derive(Debug, Clone)]
pub struct PartitionRegistry {
    generation: u32,
    names: Vec<String>,
}

impl PartitionRegistry {
    /// Build the registry for a cache generation.
    pub fn new(generation: u32) -> Self {
        let names = PartitionKind::ALL
            .iter()
            .map(|kind| format!("squall-{}-v{generation}", kind.slug()))
            .collect();
        Self { generation, names }
    }

    /// The generation this registry was built for.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// The current partition name for a kind.
    pub fn name_for(&self, kind: PartitionKind) -> &str {
        let idx = PartitionKind::ALL
            .iter()
            .position(|k| *k == kind)
            .unwrap_or(0);
        &self.names[idx]
    }

    /// Whether a partition name belongs to the current generation.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// All current partition names.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}
