//! Core eviction policy trait definition

use crate::entry::CacheEntry;

/// Eviction policy trait
pub trait EvictionPolicy: Send {
    /// Record insertion (or replacement) of a key
    fn on_insert(&mut self, key: &str, entry: &CacheEntry);

    /// Record a hit on a key
    fn on_access(&mut self, key: &str, entry: &CacheEntry);

    /// Record removal of a key
    fn on_remove(&mut self, key: &str);

    /// Key that should be evicted next, if any is tracked
    fn next_eviction(&self) -> Option<String>;

    /// Clear all tracking data
    fn clear(&mut self);

    /// Number of tracked keys
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
