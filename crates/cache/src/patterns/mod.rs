//! Access-pattern tracking for predictive preloading
//!
//! Every lookup records an access. Keys looked up within the trailing access
//! window before `k` become `k`'s co-occurrences, and the most frequent of
//! those are preloaded after `k` is found.

mod store;
mod table;

pub use store::{FilePatternStore, MemoryPatternStore, PATTERNS_FILE_NAME};
pub use table::{AccessPattern, PatternTable};

use crate::config::{CacheConfig, PatternStoreKind};
use crate::errors::Result;
use crate::lock::LockManager;
use std::fmt::Debug;
use std::path::Path;
use std::time::SystemTime;

/// Storage for access-pattern records
///
/// Errors are reported to the caller, which treats them as non-fatal.
pub trait PatternStore: Send + Sync + Debug {
    /// Record an access to `key`
    fn record_access(&self, key: &str, now: SystemTime) -> Result<()>;

    /// Co-accessed keys of `key` with their counts, most frequent first
    fn ranked_neighbours(&self, key: &str) -> Result<Vec<(String, u64)>>;

    /// Copy of `key`'s record
    fn pattern(&self, key: &str) -> Result<Option<AccessPattern>>;

    fn clear(&self) -> Result<()>;
}

/// Create the store selected by the configuration
pub fn create_pattern_store(
    config: &CacheConfig,
    root: &Path,
    locks: &LockManager,
) -> Box<dyn PatternStore> {
    match config.pattern_store {
        PatternStoreKind::Memory => Box::new(MemoryPatternStore::new(config.access_window)),
        PatternStoreKind::Shared => Box::new(FilePatternStore::new(
            root,
            locks.clone(),
            config.access_window,
        )),
    }
}

/// Top `factor` share of `ranked`, rounded up, at least one
pub fn select_candidates(ranked: Vec<(String, u64)>, factor: f64) -> Vec<String> {
    if ranked.is_empty() {
        return Vec::new();
    }

    let wanted = (ranked.len() as f64 * factor).ceil() as usize;
    let count = wanted.clamp(1, ranked.len());
    ranked.into_iter().take(count).map(|(key, _)| key).collect()
}
