//! Cache put operations

use crate::codec::Codec;
use crate::entry::CacheEntry;
use crate::errors::Result;
use crate::lock::LockScope;
use serde::Serialize;
use std::collections::BTreeSet;

use super::super::types::{Cache, EntryOptions};
use super::utils::validate_key;

impl<C: Codec> Cache<C> {
    /// Store a value with the default TTL and no dependencies
    ///
    /// Returns the value back to the caller.
    pub fn set<T>(&self, key: &str, value: T) -> Result<T>
    where
        T: Serialize,
    {
        self.set_with(key, value, EntryOptions::default())
    }

    /// Store a value with an explicit TTL and/or dependencies
    ///
    /// Only an empty key or a value the codec cannot encode is an error.
    /// Disk and lock failures are logged and counted; the write then lands
    /// in whichever tier is still usable.
    pub fn set_with<T>(&self, key: &str, value: T, options: EntryOptions) -> Result<T>
    where
        T: Serialize,
    {
        validate_key(key)?;
        let bytes = self.inner.codec.encode(key, &value)?;
        self.store(key, bytes, options);
        Ok(value)
    }

    fn store(&self, key: &str, bytes: Vec<u8>, options: EntryOptions) {
        let cache_type = self.inner.config.cache_type;
        let ttl = options.ttl.unwrap_or(self.inner.config.default_ttl);
        let entry = CacheEntry::new(key, bytes, ttl, options.dependencies);
        let dependencies = entry.dependencies.clone();

        let index = self.inner.router.partition(key);
        let (previous, written) = {
            let mut partition = self.inner.memory.lock(index);
            let _lock = cache_type
                .uses_disk()
                .then(|| self.distributed_lock(LockScope::Key(key)))
                .flatten();

            let mut previous = partition.peek(key).map(|old| old.dependencies.clone());
            let mut written = false;

            if cache_type.uses_disk() {
                if previous.is_none() {
                    previous = self
                        .inner
                        .disk
                        .read(key)
                        .ok()
                        .flatten()
                        .map(|old| old.dependencies);
                }

                match self.inner.disk.write(&entry) {
                    Ok(size) => {
                        written = true;
                        tracing::trace!(key, size, "wrote cache blob");
                    }
                    Err(e) => {
                        self.inner.stats.record_io_error();
                        tracing::warn!(key, error = %e, "failed to write cache blob");
                    }
                }
            }

            if cache_type.uses_memory() {
                let evicted = partition.insert(entry);
                if !evicted.is_empty() {
                    tracing::trace!(key, partition = index, evicted = ?evicted, "evicted from memory");
                }
                self.inner.stats.record_evictions(evicted.len() as u64);
            }

            (previous.unwrap_or_default(), written)
        };

        self.update_dependency_index(key, &previous, &dependencies);

        if written {
            self.maybe_sweep();
        }
    }

    /// Register `key` under its dependencies and drop it from the ones it no
    /// longer declares
    fn update_dependency_index(
        &self,
        key: &str,
        previous: &BTreeSet<String>,
        current: &BTreeSet<String>,
    ) {
        for dependency in current {
            let _lock = self.distributed_lock(LockScope::DependencyIndex(dependency));
            if let Err(e) = self.inner.deps.register(dependency, key) {
                self.inner.stats.record_io_error();
                tracing::warn!(key, dependency = %dependency, error = %e, "failed to register dependency");
            }
        }

        self.unregister_dependencies(key, previous.difference(current));
    }

    pub(in crate::core) fn unregister_dependencies<'a>(
        &self,
        key: &str,
        dependencies: impl IntoIterator<Item = &'a String>,
    ) {
        for dependency in dependencies {
            let _lock = self.distributed_lock(LockScope::DependencyIndex(dependency));
            if let Err(e) = self.inner.deps.unregister(dependency, key) {
                self.inner.stats.record_io_error();
                tracing::warn!(key, dependency = %dependency, error = %e, "failed to unregister dependency");
            }
        }
    }
}
