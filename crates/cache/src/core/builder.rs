//! Cache construction

use crate::codec::{Codec, JsonCodec};
use crate::config::CacheConfig;
use crate::deps::DependencyIndex;
use crate::disk::DiskTier;
use crate::errors::{CacheError, Result};
use crate::lock::LockManager;
use crate::memory::MemoryTier;
use crate::partition::PartitionRouter;
use crate::patterns::create_pattern_store;
use crate::stats::CacheStats;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use super::types::{Cache, CacheInner};

impl Cache<JsonCodec> {
    /// Open a cache rooted at `root` with JSON-encoded values
    ///
    /// `<root>/tiercache.json`, when present, overrides `config`. Fails only
    /// when the root or its lock directory cannot be created.
    pub fn open(root: impl Into<PathBuf>, config: CacheConfig) -> Result<Self> {
        CacheBuilder::new(root).config(config).build()
    }

    pub fn builder(root: impl Into<PathBuf>) -> CacheBuilder {
        CacheBuilder::new(root)
    }
}

/// Builder for [`Cache`]
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    root: PathBuf,
    config: CacheConfig,
}

impl CacheBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            config: CacheConfig::default(),
        }
    }

    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Build with the default JSON codec
    pub fn build(self) -> Result<Cache<JsonCodec>> {
        self.build_with_codec(JsonCodec)
    }

    /// Build with a custom value codec
    pub fn build_with_codec<C: Codec>(self, codec: C) -> Result<Cache<C>> {
        let root = self.root;
        fs::create_dir_all(&root)
            .map_err(|e| CacheError::io(&root, "create cache directory", e))?;

        let (config, config_source) = self.config.overlay_from_dir(&root);
        let locks = LockManager::new(&root, config.lock_timeout)?;
        let patterns = create_pattern_store(&config, &root, &locks);

        tracing::debug!(
            root = %root.display(),
            cache_type = %config.cache_type,
            partitions = config.partition_count,
            eviction_policy = %config.eviction_policy,
            "opened cache"
        );

        let inner = CacheInner {
            router: PartitionRouter::new(config.partition_count),
            memory: MemoryTier::new(&config),
            disk: DiskTier::new(&root, config.compression_threshold),
            deps: DependencyIndex::new(&root),
            stats: CacheStats::default(),
            locks,
            patterns,
            codec,
            config,
            config_source,
            root,
        };

        Ok(Cache {
            inner: Arc::new(inner),
        })
    }
}
