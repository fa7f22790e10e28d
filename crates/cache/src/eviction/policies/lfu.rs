//! LFU (Least Frequently Used) eviction policy implementation

use crate::entry::CacheEntry;
use crate::eviction::traits::EvictionPolicy;
use indexmap::IndexMap;

/// LFU (Least Frequently Used) eviction policy
///
/// Frequencies mirror each entry's `access_count`. Ties go to the key that
/// was inserted first.
#[derive(Debug, Default)]
pub struct LfuPolicy {
    frequencies: IndexMap<String, u64>,
}

impl LfuPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionPolicy for LfuPolicy {
    fn on_insert(&mut self, key: &str, entry: &CacheEntry) {
        self.frequencies.shift_remove(key);
        self.frequencies.insert(key.to_string(), entry.access_count);
    }

    fn on_access(&mut self, key: &str, entry: &CacheEntry) {
        if let Some(freq) = self.frequencies.get_mut(key) {
            *freq = entry.access_count;
        }
    }

    fn on_remove(&mut self, key: &str) {
        self.frequencies.shift_remove(key);
    }

    fn next_eviction(&self) -> Option<String> {
        // O(n) scan for the global minimum of the partition
        self.frequencies
            .iter()
            .min_by_key(|(_, freq)| **freq)
            .map(|(key, _)| key.clone())
    }

    fn clear(&mut self) {
        self.frequencies.clear();
    }

    fn len(&self) -> usize {
        self.frequencies.len()
    }
}
