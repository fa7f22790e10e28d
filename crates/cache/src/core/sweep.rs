//! Disk-size sweep
//!
//! Runs after a write pushes the disk tier over `max_disk_size` and brings it
//! back down to 90% of the limit. Victims are invalidated, not just deleted,
//! so the dependency index stays consistent. Only one process sweeps a root
//! at a time; everyone else skips.

use crate::codec::Codec;
use crate::disk::{order_candidates, sweep_target};
use crate::errors::CacheError;
use crate::lock::{GlobalLock, LockScope};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::PathBuf;

use super::types::Cache;

/// What a sweep did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Victim entries removed for size
    pub evicted: usize,
    /// Dependents removed along with them
    pub invalidated: usize,
    /// Blob bytes removed, dependents' blobs included
    pub freed_bytes: u64,
    /// Disk usage when the sweep finished
    pub remaining_bytes: u64,
}

impl<C: Codec> Cache<C> {
    pub(super) fn maybe_sweep(&self) {
        let max = self.inner.config.max_disk_size;
        match self.inner.disk.total_size() {
            Ok(total) if total > max => {
                self.sweep();
            }
            Ok(_) => {}
            Err(e) => {
                self.inner.stats.record_io_error();
                tracing::warn!(error = %e, "failed to measure disk tier");
            }
        }
    }

    /// Evict disk entries until usage is at or below 90% of `max_disk_size`
    ///
    /// Returns `None` when another process holds the sweep lock, the disk
    /// tier is disabled, or the directory could not be scanned.
    pub fn sweep(&self) -> Option<SweepReport> {
        if !self.inner.config.cache_type.uses_disk() {
            return None;
        }

        let _lock = match self
            .inner
            .locks
            .try_acquire(LockScope::Global(GlobalLock::Sweep))
        {
            Ok(Some(lock)) => lock,
            Ok(None) => {
                tracing::debug!("disk sweep already running elsewhere, skipping");
                return None;
            }
            Err(e) => {
                self.inner.stats.record_io_error();
                tracing::warn!(error = %e, "failed to take sweep lock, skipping sweep");
                return None;
            }
        };

        let mut candidates = match self.inner.disk.sweep_candidates() {
            Ok(candidates) => candidates,
            Err(e) => {
                self.inner.stats.record_io_error();
                tracing::warn!(error = %e, "failed to scan disk tier, skipping sweep");
                return None;
            }
        };

        let max = self.inner.config.max_disk_size;
        let target = sweep_target(max);
        let mut report = SweepReport {
            remaining_bytes: candidates.iter().map(|c| c.size).sum(),
            ..SweepReport::default()
        };
        if report.remaining_bytes <= max {
            tracing::debug!(
                used = report.remaining_bytes,
                max,
                "disk tier already within limit"
            );
            return Some(report);
        }

        order_candidates(&mut candidates, self.inner.config.eviction_policy);
        let sizes: HashMap<PathBuf, u64> = candidates
            .iter()
            .map(|c| (c.path.clone(), c.size))
            .collect();
        // Blobs already accounted for, by this sweep or by someone else
        let mut gone: HashSet<PathBuf> = HashSet::new();

        for candidate in &candidates {
            if report.remaining_bytes <= target {
                break;
            }
            if gone.contains(&candidate.path) {
                continue;
            }

            match self.inner.disk.read_path(&candidate.path) {
                Ok(entry) => {
                    let cascade = self.cascade(&entry.key);
                    if cascade.root_existed {
                        report.evicted += 1;
                    } else {
                        // Removed concurrently before the cascade reached it
                        gone.insert(candidate.path.clone());
                        report.remaining_bytes =
                            report.remaining_bytes.saturating_sub(candidate.size);
                    }
                    report.invalidated += cascade
                        .removed
                        .len()
                        .saturating_sub(usize::from(cascade.root_existed));

                    for key in &cascade.removed {
                        let path = self.inner.disk.entry_path(key);
                        let Some(&size) = sizes.get(&path) else {
                            continue;
                        };
                        if gone.insert(path) {
                            report.freed_bytes += size;
                            report.remaining_bytes = report.remaining_bytes.saturating_sub(size);
                        }
                    }
                    tracing::debug!(
                        key = %entry.key,
                        size = candidate.size,
                        invalidated = cascade.removed.len(),
                        "swept disk entry"
                    );
                }
                // Already removed, possibly by another process
                Err(CacheError::Io { ref source, .. })
                    if source.kind() == io::ErrorKind::NotFound =>
                {
                    gone.insert(candidate.path.clone());
                    report.remaining_bytes = report.remaining_bytes.saturating_sub(candidate.size);
                }
                Err(e) => {
                    tracing::warn!(
                        path = %candidate.path.display(),
                        error = %e,
                        "removing unreadable blob during sweep"
                    );
                    match self.inner.disk.remove_path(&candidate.path) {
                        Ok(_) => {
                            report.evicted += 1;
                            gone.insert(candidate.path.clone());
                            report.freed_bytes += candidate.size;
                            report.remaining_bytes =
                                report.remaining_bytes.saturating_sub(candidate.size);
                        }
                        Err(e) => {
                            self.inner.stats.record_io_error();
                            tracing::warn!(error = %e, "failed to remove blob during sweep");
                        }
                    }
                }
            }
        }

        self.inner.stats.record_evictions(report.evicted as u64);
        self.inner.stats.record_invalidations(report.invalidated as u64);

        if let Ok(remaining) = self.inner.disk.total_size() {
            report.remaining_bytes = remaining;
        }

        tracing::info!(
            evicted = report.evicted,
            invalidated = report.invalidated,
            freed_bytes = report.freed_bytes,
            remaining_bytes = report.remaining_bytes,
            max_bytes = max,
            "disk sweep finished"
        );
        Some(report)
    }
}
