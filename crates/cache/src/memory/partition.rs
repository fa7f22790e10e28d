//! A single memory partition

use crate::config::EvictionPolicyKind;
use crate::entry::CacheEntry;
use crate::eviction::{create_eviction_policy, EvictionPolicy};
use std::collections::HashMap;
use std::time::SystemTime;

/// Result of a memory lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Live entry; the payload is a copy
    Hit(Vec<u8>),
    /// The entry had expired and has been dropped
    Expired,
    Missing,
}

/// Entries of one partition plus their eviction order
pub struct MemoryPartition {
    entries: HashMap<String, CacheEntry>,
    policy: Box<dyn EvictionPolicy>,
    capacity: usize,
}

impl MemoryPartition {
    pub fn new(capacity: usize, policy: EvictionPolicyKind) -> Self {
        Self {
            entries: HashMap::new(),
            policy: create_eviction_policy(policy),
            capacity: capacity.max(1),
        }
    }

    /// Look up a key, updating access bookkeeping on a hit
    ///
    /// Expired entries are removed lazily here.
    pub fn get(&mut self, key: &str, now: SystemTime) -> Lookup {
        let expired = match self.entries.get_mut(key) {
            None => return Lookup::Missing,
            Some(entry) if entry.is_expired_at(now) => true,
            Some(entry) => {
                entry.record_access();
                self.policy.on_access(key, entry);
                return Lookup::Hit(entry.value.clone());
            }
        };

        debug_assert!(expired);
        self.remove(key);
        Lookup::Expired
    }

    /// Insert or replace an entry, evicting as needed
    ///
    /// Returns the keys evicted to make room.
    pub fn insert(&mut self, entry: CacheEntry) -> Vec<String> {
        let mut evicted = Vec::new();

        if !self.entries.contains_key(&entry.key) {
            while self.entries.len() >= self.capacity {
                let Some(victim) = self.policy.next_eviction() else {
                    break;
                };
                self.remove(&victim);
                evicted.push(victim);
            }
        }

        self.policy.on_insert(&entry.key, &entry);
        self.entries.insert(entry.key.clone(), entry);
        evicted
    }

    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.policy.on_remove(key);
        }
        removed
    }

    /// Entry without touching access bookkeeping
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Whether a non-expired entry is resident
    pub fn contains_live(&self, key: &str, now: SystemTime) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.policy.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
