//! Cache get operations

use crate::codec::Codec;
use crate::config::CacheType;
use crate::errors::CacheError;
use crate::memory::Lookup;
use serde::de::DeserializeOwned;
use std::time::SystemTime;

use super::super::types::Cache;

impl<C: Codec> Cache<C> {
    /// Get a value, or `default` when the key is missing, expired, or
    /// cannot be decoded as `T`
    pub fn get<T>(&self, key: &str, default: T) -> T
    where
        T: DeserializeOwned,
    {
        self.try_get(key).unwrap_or(default)
    }

    /// Get a value if present
    pub fn try_get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let bytes = self.get_raw(key)?;
        match self.inner.codec.decode(key, &bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "cached value does not decode as the requested type");
                None
            }
        }
    }

    /// Get the encoded payload of a key
    ///
    /// Records the access for preloading. A memory miss falls through to disk;
    /// under the hybrid cache type a disk hit is promoted into memory and
    /// co-accessed keys are preloaded afterwards.
    pub fn get_raw(&self, key: &str) -> Option<Vec<u8>> {
        let now = SystemTime::now();
        self.record_access(key, now);

        let value = self.lookup(key, now);
        if value.is_some() && self.inner.config.cache_type == CacheType::Hybrid {
            self.preload_neighbours(key);
        }
        value
    }

    fn lookup(&self, key: &str, now: SystemTime) -> Option<Vec<u8>> {
        let cache_type = self.inner.config.cache_type;
        let index = self.inner.router.partition(key);
        let mut partition = self.inner.memory.lock(index);

        if cache_type.uses_memory() {
            match partition.get(key, now) {
                Lookup::Hit(value) => {
                    self.inner.stats.record_memory_hit();
                    tracing::trace!(key, partition = index, "memory hit");
                    return Some(value);
                }
                Lookup::Expired => {
                    self.inner.stats.record_memory_miss();
                    tracing::trace!(key, partition = index, "memory entry expired");
                }
                Lookup::Missing => {
                    self.inner.stats.record_memory_miss();
                    tracing::trace!(key, partition = index, "memory miss");
                }
            }
        }

        if !cache_type.uses_disk() {
            return None;
        }

        let Some(mut entry) = self.read_disk_entry(key, now) else {
            self.inner.stats.record_disk_miss();
            tracing::trace!(key, "disk miss");
            return None;
        };

        self.inner.stats.record_disk_hit();
        tracing::trace!(key, "disk hit");

        if cache_type != CacheType::Hybrid {
            return Some(entry.value);
        }

        entry.record_access();
        let value = entry.value.clone();
        let evicted = partition.insert(entry);
        self.inner.stats.record_evictions(evicted.len() as u64);
        Some(value)
    }

    fn record_access(&self, key: &str, now: SystemTime) {
        match self.inner.patterns.record_access(key, now) {
            Ok(()) => {}
            Err(CacheError::LockTimeout { .. }) => {
                self.inner.stats.record_lock_contention();
                tracing::debug!(key, "access pattern lock busy, access not recorded");
            }
            Err(e) => {
                self.inner.stats.record_io_error();
                tracing::debug!(key, error = %e, "failed to record access pattern");
            }
        }
    }
}
