//! LRU (Least Recently Used) eviction policy implementation

use crate::entry::CacheEntry;
use crate::eviction::traits::EvictionPolicy;
use indexmap::IndexSet;

/// LRU (Least Recently Used) eviction policy
///
/// Keys are kept in access order: the front is least recently used.
#[derive(Debug, Default)]
pub struct LruPolicy {
    access_order: IndexSet<String>,
}

impl LruPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    fn touch(&mut self, key: &str) {
        self.access_order.shift_remove(key);
        self.access_order.insert(key.to_string());
    }
}

impl EvictionPolicy for LruPolicy {
    fn on_insert(&mut self, key: &str, _entry: &CacheEntry) {
        self.touch(key);
    }

    fn on_access(&mut self, key: &str, _entry: &CacheEntry) {
        self.touch(key);
    }

    fn on_remove(&mut self, key: &str) {
        self.access_order.shift_remove(key);
    }

    fn next_eviction(&self) -> Option<String> {
        self.access_order.first().cloned()
    }

    fn clear(&mut self) {
        self.access_order.clear();
    }

    fn len(&self) -> usize {
        self.access_order.len()
    }
}
