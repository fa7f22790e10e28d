//! Shared helpers for cache operations

use crate::codec::Codec;
use crate::entry::CacheEntry;
use crate::errors::{CacheError, Result};
use crate::lock::LockScope;
use std::time::SystemTime;
use tiercache_utils::FileLock;

use super::super::types::Cache;

/// Reject keys that cannot be stored
pub(in crate::core) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey {
            key: key.to_string(),
            reason: "key must not be empty".to_string(),
        });
    }
    Ok(())
}

impl<C: Codec> Cache<C> {
    /// Take a distributed lock, degrading to local-only locking
    ///
    /// `None` means the caller continues under its partition lock alone.
    pub(in crate::core) fn distributed_lock(&self, scope: LockScope<'_>) -> Option<FileLock> {
        match self.inner.locks.acquire(scope) {
            Ok(lock) => Some(lock),
            Err(CacheError::LockTimeout { name, waited }) => {
                self.inner.stats.record_lock_contention();
                tracing::warn!(
                    lock = %name,
                    waited_ms = waited.as_millis() as u64,
                    "distributed lock timed out, continuing with local lock only"
                );
                None
            }
            Err(e) => {
                self.inner.stats.record_io_error();
                tracing::warn!(
                    error = %e,
                    "failed to take distributed lock, continuing with local lock only"
                );
                None
            }
        }
    }

    /// Read a live entry from disk
    ///
    /// Expired and corrupt blobs are removed and reported as absent. Other
    /// I/O failures are counted and also reported as absent.
    pub(in crate::core) fn read_disk_entry(&self, key: &str, now: SystemTime) -> Option<CacheEntry> {
        match self.inner.disk.read(key) {
            Ok(Some(entry)) if entry.is_expired_at(now) => {
                tracing::trace!(key, "disk entry expired");
                self.discard_blob(key);
                None
            }
            Ok(entry) => entry,
            Err(e) if e.is_corruption() => {
                tracing::warn!(key, error = %e, "removing unreadable cache blob");
                self.discard_blob(key);
                None
            }
            Err(e) => {
                self.inner.stats.record_io_error();
                tracing::warn!(key, error = %e, "failed to read cache blob");
                None
            }
        }
    }

    /// Best-effort removal of a key's blob
    pub(in crate::core) fn discard_blob(&self, key: &str) {
        let _lock = self.distributed_lock(LockScope::Key(key));
        if let Err(e) = self.inner.disk.remove(key) {
            self.inner.stats.record_io_error();
            tracing::warn!(key, error = %e, "failed to remove cache blob");
        }
    }
}
