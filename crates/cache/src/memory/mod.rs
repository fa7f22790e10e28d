//! Memory tier: one locked partition per shard of the key space
//!
//! Capacity is divided evenly across partitions and each partition evicts on
//! its own, so eviction order is only exact within a partition.

mod partition;

pub use partition::{Lookup, MemoryPartition};

use crate::config::CacheConfig;
use parking_lot::{Mutex, MutexGuard};

/// All partitions of the memory tier
pub struct MemoryTier {
    partitions: Vec<Mutex<MemoryPartition>>,
}

impl MemoryTier {
    pub fn new(config: &CacheConfig) -> Self {
        let capacity = config.per_partition_capacity();
        let partitions = (0..config.partition_count.max(1))
            .map(|_| Mutex::new(MemoryPartition::new(capacity, config.eviction_policy)))
            .collect();

        Self { partitions }
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Lock one partition
    ///
    /// The guard is the in-process lock for every key routed to `index`.
    pub fn lock(&self, index: usize) -> MutexGuard<'_, MemoryPartition> {
        self.partitions[index].lock()
    }

    /// Lock every partition in index order
    pub fn lock_all(&self) -> Vec<MutexGuard<'_, MemoryPartition>> {
        self.partitions.iter().map(|p| p.lock()).collect()
    }

    /// Total entries across partitions
    pub fn len(&self) -> usize {
        self.partitions.iter().map(|p| p.lock().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for MemoryTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTier")
            .field("partitions", &self.partitions.len())
            .finish()
    }
}
