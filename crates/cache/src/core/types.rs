//! Core cache types and structures

use crate::codec::{Codec, JsonCodec};
use crate::config::{CacheConfig, ConfigSource};
use crate::deps::DependencyIndex;
use crate::disk::DiskTier;
use crate::lock::LockManager;
use crate::memory::MemoryTier;
use crate::partition::PartitionRouter;
use crate::patterns::PatternStore;
use crate::stats::CacheStats;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Hybrid memory/disk cache shared by every process using the same root
///
/// Cloning is cheap and clones share all state.
pub struct Cache<C: Codec = JsonCodec> {
    pub(super) inner: Arc<CacheInner<C>>,
}

pub(super) struct CacheInner<C> {
    /// Effective configuration after the on-disk overlay
    pub config: CacheConfig,
    pub config_source: ConfigSource,
    /// Cache root shared with other processes
    pub root: PathBuf,
    pub router: PartitionRouter,
    pub memory: MemoryTier,
    pub disk: DiskTier,
    pub locks: LockManager,
    pub deps: DependencyIndex,
    pub patterns: Box<dyn PatternStore>,
    pub stats: CacheStats,
    pub codec: C,
}

impl<C: Codec> Clone for Cache<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Codec> std::fmt::Debug for Cache<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("root", &self.inner.root)
            .field("cache_type", &self.inner.config.cache_type)
            .field("partitions", &self.inner.router.partition_count())
            .field("memory_entries", &self.inner.memory.len())
            .finish()
    }
}

/// Per-entry options for [`Cache::set_with`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryOptions {
    /// Lifetime of the entry; the configured default when `None`
    pub ttl: Option<Duration>,
    /// Keys whose invalidation also invalidates this entry
    pub dependencies: BTreeSet<String>,
}

impl EntryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn depends_on(mut self, key: impl Into<String>) -> Self {
        self.dependencies.insert(key.into());
        self
    }

    pub fn dependencies<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.dependencies.extend(keys.into_iter().map(Into::into));
        self
    }
}
