//! FIFO (First In, First Out) eviction policy implementation

use crate::entry::CacheEntry;
use crate::eviction::traits::EvictionPolicy;
use indexmap::IndexMap;
use std::time::SystemTime;

/// FIFO eviction policy: the entry with the oldest `created_at` goes first
///
/// Hits do not change the order. Re-setting a key gives it a new creation
/// time.
#[derive(Debug, Default)]
pub struct FifoPolicy {
    created: IndexMap<String, SystemTime>,
}

impl FifoPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionPolicy for FifoPolicy {
    fn on_insert(&mut self, key: &str, entry: &CacheEntry) {
        self.created.shift_remove(key);
        self.created.insert(key.to_string(), entry.created_at);
    }

    fn on_access(&mut self, _key: &str, _entry: &CacheEntry) {}

    fn on_remove(&mut self, key: &str) {
        self.created.shift_remove(key);
    }

    fn next_eviction(&self) -> Option<String> {
        self.created
            .iter()
            .min_by_key(|(_, created_at)| **created_at)
            .map(|(key, _)| key.clone())
    }

    fn clear(&mut self) {
        self.created.clear();
    }

    fn len(&self) -> usize {
        self.created.len()
    }
}
