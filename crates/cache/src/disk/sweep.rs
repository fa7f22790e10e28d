//! Disk sweep candidate ordering
//!
//! Per-access counters are not persisted on disk, so LFU falls back to file
//! size (smallest first) as its approximation.

use crate::config::EvictionPolicyKind;
use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

/// A blob considered for eviction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepCandidate {
    pub path: PathBuf,
    pub size: u64,
    pub created_at: SystemTime,
    pub accessed_at: SystemTime,
}

impl SweepCandidate {
    /// Build from file metadata
    ///
    /// Filesystems without birth or access times fall back to the
    /// modification time.
    pub fn from_metadata(path: PathBuf, metadata: &fs::Metadata) -> Self {
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        Self {
            path,
            size: metadata.len(),
            created_at: metadata.created().unwrap_or(modified),
            accessed_at: metadata.accessed().unwrap_or(modified),
        }
    }
}

/// Sort candidates so the first one is evicted first
pub fn order_candidates(candidates: &mut [SweepCandidate], policy: EvictionPolicyKind) {
    match policy {
        EvictionPolicyKind::Lru => candidates.sort_by_key(|c| c.accessed_at),
        EvictionPolicyKind::Lfu => candidates.sort_by_key(|c| c.size),
        EvictionPolicyKind::Fifo => candidates.sort_by_key(|c| c.created_at),
    }
}

/// Size a sweep reduces the tier to: 90% of the maximum
pub fn sweep_target(max_disk_size: u64) -> u64 {
    max_disk_size / 10 * 9 + max_disk_size % 10 * 9 / 10
}
