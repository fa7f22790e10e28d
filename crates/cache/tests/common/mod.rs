//! Shared helpers for cache integration tests

#![allow(dead_code)]

use std::time::Duration;
use tempfile::TempDir;
use tiercache::{Cache, CacheConfig, CacheConfigBuilder, CacheType, EvictionPolicyKind};

/// Builder for test caches rooted in a fresh temporary directory
pub struct TestCacheBuilder {
    config: CacheConfigBuilder,
}

impl TestCacheBuilder {
    /// One partition, so every key competes for the same capacity
    pub fn new() -> Self {
        Self {
            config: CacheConfig::builder()
                .partition_count(1)
                .lock_timeout(Duration::from_millis(200)),
        }
    }

    pub fn cache_type(mut self, cache_type: CacheType) -> Self {
        self.config = self.config.cache_type(cache_type);
        self
    }

    pub fn capacity(mut self, entries: usize) -> Self {
        self.config = self.config.max_memory_size(entries);
        self
    }

    pub fn policy(mut self, policy: EvictionPolicyKind) -> Self {
        self.config = self.config.eviction_policy(policy);
        self
    }

    pub fn with(mut self, f: impl FnOnce(CacheConfigBuilder) -> CacheConfigBuilder) -> Self {
        self.config = f(self.config);
        self
    }

    pub fn config(self) -> CacheConfig {
        self.config.build()
    }

    pub fn build(self) -> (Cache, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let cache = Cache::open(temp_dir.path(), self.config.build()).unwrap();
        (cache, temp_dir)
    }
}

impl Default for TestCacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of `.entry` blobs in a cache root
pub fn blob_count(dir: &TempDir) -> usize {
    files_with_extension(dir, "entry")
}

/// Number of reverse-dependency files in a cache root
pub fn index_count(dir: &TempDir) -> usize {
    files_with_extension(dir, "deps")
}

fn files_with_extension(dir: &TempDir, extension: &str) -> usize {
    std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some(extension))
        .count()
}
