//! Access-pattern records and their bookkeeping

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, SystemTime};

/// Records idle for this many access windows are dropped
const RETENTION_WINDOWS: u32 = 10;

/// Per-key access statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPattern {
    pub last_access: SystemTime,
    pub access_count: u64,
    /// How often each other key was accessed shortly before this one
    pub co_occurrences: HashMap<String, u64>,
}

impl AccessPattern {
    fn new(now: SystemTime) -> Self {
        Self {
            last_access: now,
            access_count: 0,
            co_occurrences: HashMap::new(),
        }
    }
}

/// Access patterns for every tracked key
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PatternTable {
    records: HashMap<String, AccessPattern>,
    #[serde(default)]
    last_prune: Option<SystemTime>,
}

impl PatternTable {
    /// Record an access to `key` at `now`
    ///
    /// Every other key last accessed within `window` before `now` gains one
    /// co-occurrence in `key`'s record.
    pub fn record(&mut self, key: &str, now: SystemTime, window: Duration) {
        let recent: Vec<String> = self
            .records
            .iter()
            .filter(|(other, pattern)| {
                other.as_str() != key && within(pattern.last_access, now, window)
            })
            .map(|(other, _)| other.clone())
            .collect();

        let pattern = self
            .records
            .entry(key.to_string())
            .or_insert_with(|| AccessPattern::new(now));
        pattern.access_count = pattern.access_count.saturating_add(1);
        pattern.last_access = pattern.last_access.max(now);
        for other in recent {
            let count = pattern.co_occurrences.entry(other).or_insert(0);
            *count = count.saturating_add(1);
        }

        self.maybe_prune(now, window);
    }

    /// Co-accessed keys of `key`, most frequent first, ties by key
    pub fn ranked(&self, key: &str) -> Vec<(String, u64)> {
        let Some(pattern) = self.records.get(key) else {
            return Vec::new();
        };

        let mut ranked: Vec<(String, u64)> = pattern
            .co_occurrences
            .iter()
            .map(|(other, count)| (other.clone(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    pub fn get(&self, key: &str) -> Option<&AccessPattern> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.last_prune = None;
    }

    /// Drop records idle for longer than the retention period
    ///
    /// Co-occurrence counters pointing at a dropped record go with it, so a
    /// record never tracks more neighbours than the table holds keys.
    pub fn prune(&mut self, now: SystemTime, window: Duration) {
        let retention = window.saturating_mul(RETENTION_WINDOWS);
        self.records
            .retain(|_, pattern| within(pattern.last_access, now, retention));

        let live: HashSet<String> = self.records.keys().cloned().collect();
        for pattern in self.records.values_mut() {
            pattern.co_occurrences.retain(|other, _| live.contains(other));
        }
        self.last_prune = Some(now);
    }

    // At most once per window
    fn maybe_prune(&mut self, now: SystemTime, window: Duration) {
        let due = match self.last_prune {
            None => true,
            Some(last) => !within(last, now, window),
        };
        if due {
            self.prune(now, window);
        }
    }
}

// `then` happened no more than `window` before `now`. Timestamps from the
// future (clock skew between processes) count as recent.
fn within(then: SystemTime, now: SystemTime, window: Duration) -> bool {
    match now.duration_since(then) {
        Ok(elapsed) => elapsed <= window,
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(5);

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000 + secs)
    }

    #[test]
    fn test_co_occurrence_within_window() {
        let mut table = PatternTable::default();
        table.record("x", at(0), WINDOW);
        table.record("y", at(1), WINDOW);

        assert_eq!(table.ranked("y"), vec![("x".to_string(), 1)]);
        // Forward only: x saw nothing before it
        assert!(table.ranked("x").is_empty());
        assert_eq!(table.get("y").unwrap().access_count, 1);
    }

    #[test]
    fn test_accesses_outside_window_are_ignored() {
        let mut table = PatternTable::default();
        table.record("x", at(0), WINDOW);
        table.record("y", at(6), WINDOW);

        assert!(table.ranked("y").is_empty());
    }

    #[test]
    fn test_ranking_is_by_count_then_key() {
        let mut table = PatternTable::default();
        for round in 0..3 {
            let t = round * 10;
            table.record("b", at(t), WINDOW);
            if round < 2 {
                table.record("c", at(t), WINDOW);
            }
            table.record("a", at(t + 1), WINDOW);
            table.record("k", at(t + 2), WINDOW);
        }

        let ranked: Vec<String> = table.ranked("k").into_iter().map(|(k, _)| k).collect();
        assert_eq!(ranked, vec!["a", "b", "c"]);
        assert_eq!(table.ranked("k")[0].1, 3);
    }

    #[test]
    fn test_repeated_self_access_is_not_a_co_occurrence() {
        let mut table = PatternTable::default();
        table.record("x", at(0), WINDOW);
        table.record("x", at(1), WINDOW);

        assert!(table.ranked("x").is_empty());
        assert_eq!(table.get("x").unwrap().access_count, 2);
    }

    #[test]
    fn test_idle_records_are_pruned() {
        let mut table = PatternTable::default();
        table.record("old", at(0), WINDOW);
        table.record("new", at(49), WINDOW);
        assert_eq!(table.len(), 2);

        table.record("new", at(55), WINDOW);
        assert!(table.get("old").is_none());
        assert!(table.get("new").is_some());
    }

    #[test]
    fn test_pruning_trims_co_occurrences_of_live_records() {
        let mut table = PatternTable::default();
        for i in 0..500u64 {
            table.record(&format!("k{i}"), at(2 * i), WINDOW);
            table.record("hot", at(2 * i + 1), WINDOW);

            let hot = table.get("hot").unwrap();
            assert!(hot.co_occurrences.len() <= table.len());
        }

        assert!(table.len() < 60);
        let hot = table.get("hot").unwrap();
        assert!(hot.co_occurrences.len() < 60);
        assert!(hot.co_occurrences.contains_key("k499"));
        assert!(!hot.co_occurrences.contains_key("k0"));
        assert_eq!(hot.access_count, 500);
    }
}
