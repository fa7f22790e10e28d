//! Predictive preloading of co-accessed keys

use crate::codec::Codec;
use crate::patterns::select_candidates;
use std::time::SystemTime;

use super::types::Cache;

impl<C: Codec> Cache<C> {
    /// Load the keys most often accessed just before `key` into memory
    ///
    /// Candidates already in memory, missing from disk or expired are
    /// skipped. Failures never reach the caller.
    pub(super) fn preload_neighbours(&self, key: &str) -> usize {
        let ranked = match self.inner.patterns.ranked_neighbours(key) {
            Ok(ranked) => ranked,
            Err(e) => {
                tracing::debug!(key, error = %e, "failed to read access patterns, skipping preload");
                return 0;
            }
        };

        let mut preloaded = 0;
        for candidate in select_candidates(ranked, self.inner.config.preload_factor) {
            if candidate == key {
                continue;
            }
            if self.preload_one(&candidate) {
                preloaded += 1;
            }
        }

        if preloaded > 0 {
            tracing::debug!(key, preloaded, "preloaded co-accessed entries");
        }
        preloaded
    }

    fn preload_one(&self, candidate: &str) -> bool {
        let index = self.inner.router.partition(candidate);
        let mut partition = self.inner.memory.lock(index);
        let now = SystemTime::now();

        if partition.contains_live(candidate, now) {
            return false;
        }

        match self.inner.disk.read(candidate) {
            Ok(Some(entry)) if !entry.is_expired_at(now) => {
                let evicted = partition.insert(entry);
                self.inner.stats.record_evictions(evicted.len() as u64);
                self.inner.stats.record_preload();
                tracing::trace!(key = candidate, partition = index, "preloaded");
                true
            }
            Ok(_) => false,
            Err(e) => {
                tracing::debug!(key = candidate, error = %e, "preload failed");
                false
            }
        }
    }
}
