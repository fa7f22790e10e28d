//! Clear, statistics and introspection

use crate::codec::Codec;
use crate::config::{CacheConfig, ConfigSource};
use crate::errors::Result;
use crate::lock::{GlobalLock, LockScope};
use crate::stats::StatsSnapshot;
use std::path::Path;
use std::time::SystemTime;

use super::super::types::Cache;

impl<C: Codec> Cache<C> {
    /// Wipe both tiers, the dependency index and access patterns, and reset
    /// the statistics
    ///
    /// Every partition of this process is locked for the duration, together
    /// with the global clear lock shared with other processes.
    pub fn clear(&self) {
        let mut partitions = self.inner.memory.lock_all();
        let _lock = self.distributed_lock(LockScope::Global(GlobalLock::Clear));

        let memory_entries: usize = partitions.iter().map(|p| p.len()).sum();
        for partition in partitions.iter_mut() {
            partition.clear();
        }

        let mut disk_entries = 0;
        if self.inner.config.cache_type.uses_disk() {
            match self.inner.disk.clear() {
                Ok(removed) => disk_entries = removed,
                Err(e) => tracing::warn!(error = %e, "failed to clear disk tier"),
            }
        }
        if let Err(e) = self.inner.deps.clear() {
            tracing::warn!(error = %e, "failed to clear dependency index");
        }
        if let Err(e) = self.inner.patterns.clear() {
            tracing::warn!(error = %e, "failed to clear access patterns");
        }

        self.inner.stats.reset();
        tracing::info!(
            root = %self.inner.root.display(),
            memory_entries,
            disk_entries,
            "cleared cache"
        );
    }

    /// Point-in-time copy of this process's counters
    pub fn get_stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Whether a live entry exists in any active tier
    ///
    /// Leaves statistics, access patterns and the memory tier's eviction
    /// order untouched. A disk check reads the blob, which may refresh its
    /// access time on filesystems that record one and so move it later in a
    /// disk LRU sweep.
    pub fn contains(&self, key: &str) -> bool {
        let now = SystemTime::now();
        let cache_type = self.inner.config.cache_type;

        if cache_type.uses_memory() && self.memory_contains(key, now) {
            return true;
        }
        cache_type.uses_disk()
            && matches!(self.inner.disk.read(key), Ok(Some(entry)) if !entry.is_expired_at(now))
    }

    /// Whether a live entry for `key` is held in memory
    pub fn is_memory_resident(&self, key: &str) -> bool {
        self.memory_contains(key, SystemTime::now())
    }

    fn memory_contains(&self, key: &str, now: SystemTime) -> bool {
        let index = self.inner.router.partition(key);
        self.inner.memory.lock(index).contains_live(key, now)
    }

    /// Partition that owns `key`
    pub fn partition_of(&self, key: &str) -> usize {
        self.inner.router.partition(key)
    }

    /// Entries currently held in memory
    pub fn memory_len(&self) -> usize {
        self.inner.memory.len()
    }

    /// Bytes of entry blobs currently on disk
    pub fn disk_usage(&self) -> Result<u64> {
        self.inner.disk.total_size()
    }

    /// Effective configuration
    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Whether the configuration file overrode the caller's settings
    pub fn config_source(&self) -> &ConfigSource {
        &self.inner.config_source
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }
}
