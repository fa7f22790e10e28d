//! Cache remove and invalidate operations

use crate::codec::Codec;
use crate::entry::CacheEntry;
use crate::lock::LockScope;
use std::collections::{BTreeSet, HashSet};

use super::super::types::Cache;

/// Result of removing one key from both tiers
#[derive(Debug, Default)]
pub(in crate::core) struct Removal {
    /// An entry was present in at least one tier
    pub existed: bool,
    /// Dependencies the removed entry declared
    pub dependencies: BTreeSet<String>,
}

/// Outcome of a cascade starting at one key
#[derive(Debug, Default, Clone)]
pub(in crate::core) struct Cascade {
    pub root_existed: bool,
    /// Keys whose entries were removed, the root included
    pub removed: Vec<String>,
}

impl<C: Codec> Cache<C> {
    /// Remove a key from both tiers
    ///
    /// Idempotent. Dependents are left alone and no dependency bookkeeping
    /// is touched; use [`Cache::invalidate`] for that.
    pub fn remove(&self, key: &str) {
        let removal = self.remove_entry(key, None).unwrap_or_default();
        if removal.existed {
            tracing::trace!(key, "removed");
        }
    }

    /// Remove a key and, transitively, every entry that depends on it
    ///
    /// Returns how many entries were actually present and removed, `key`
    /// included. Dependency cycles are followed once.
    pub fn invalidate(&self, key: &str) -> usize {
        let removed = self.cascade(key).removed.len();
        self.inner.stats.record_invalidations(removed as u64);
        tracing::debug!(key, invalidated = removed, "invalidated");
        removed
    }

    /// Remove `key` and walk the reverse-dependency index from it
    ///
    /// A dependent is only removed while its current entry still declares
    /// the key it was reached from. Registrations left behind by entries that
    /// expired or were evicted, and were later stored again without that
    /// dependency, are dropped without touching the new entry.
    pub(in crate::core) fn cascade(&self, key: &str) -> Cascade {
        let mut visited = HashSet::new();
        let mut pending: Vec<(String, Option<String>)> = vec![(key.to_string(), None)];
        let mut cascade = Cascade::default();

        while let Some((current, via)) = pending.pop() {
            if visited.contains(&current) {
                continue;
            }

            let Some(removal) = self.remove_entry(&current, via.as_deref()) else {
                tracing::trace!(
                    key = %current,
                    dependency = ?via,
                    "entry no longer declares dependency, skipped"
                );
                continue;
            };
            visited.insert(current.clone());

            if removal.existed {
                if current == key {
                    cascade.root_existed = true;
                }
                cascade.removed.push(current.clone());
            }

            self.unregister_dependencies(&current, &removal.dependencies);

            for dependent in self.take_dependents(&current) {
                if !visited.contains(&dependent) {
                    pending.push((dependent, Some(current.clone())));
                }
            }
        }

        cascade
    }

    /// Drop a key from memory and disk under its locks
    ///
    /// With `declared` set, the entry is left in place and `None` returned
    /// when it exists but does not list `declared` among its dependencies.
    fn remove_entry(&self, key: &str, declared: Option<&str>) -> Option<Removal> {
        let still_declares = |entry: &CacheEntry| match declared {
            Some(dependency) => entry.dependencies.contains(dependency),
            None => true,
        };

        let index = self.inner.router.partition(key);
        let mut partition = self.inner.memory.lock(index);

        if partition.peek(key).is_some_and(|entry| !still_declares(entry)) {
            return None;
        }

        let mut removal = Removal::default();
        if let Some(entry) = partition.remove(key) {
            removal.existed = true;
            removal.dependencies = entry.dependencies;
        }

        if !self.inner.config.cache_type.uses_disk() {
            return Some(removal);
        }

        let _lock = self.distributed_lock(LockScope::Key(key));
        if !removal.existed {
            // Unreadable blobs are still removed below
            match self.inner.disk.read(key) {
                Ok(Some(entry)) if !still_declares(&entry) => return None,
                Ok(Some(entry)) => removal.dependencies = entry.dependencies,
                _ => {}
            }
        }

        match self.inner.disk.remove(key) {
            Ok(removed) => removal.existed |= removed,
            Err(e) => {
                self.inner.stats.record_io_error();
                tracing::warn!(key, error = %e, "failed to remove cache blob");
            }
        }
        Some(removal)
    }

    /// Read and delete the reverse-dependency file of `key`
    fn take_dependents(&self, key: &str) -> BTreeSet<String> {
        let _lock = self.distributed_lock(LockScope::DependencyIndex(key));
        match self.inner.deps.take(key) {
            Ok(dependents) => dependents,
            Err(e) => {
                if e.is_corruption() {
                    tracing::warn!(key, error = %e, "dropping unreadable dependency index");
                    let path = self.inner.deps.index_path(key);
                    if let Err(e) = tiercache_utils::remove_if_exists(&path) {
                        self.inner.stats.record_io_error();
                        tracing::warn!(key, error = %e, "failed to remove dependency index");
                    }
                } else {
                    self.inner.stats.record_io_error();
                    tracing::warn!(key, error = %e, "failed to read dependency index");
                }
                BTreeSet::new()
            }
        }
    }
}
