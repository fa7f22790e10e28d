//! Integration tests for dependency tracking and cascade invalidation

mod common;

use common::{index_count, TestCacheBuilder};
use proptest::prelude::*;
use std::collections::{BTreeSet, VecDeque};
use std::thread;
use std::time::Duration;
use tiercache::deps::DependencyIndex;
use tiercache::{CacheType, EntryOptions};

#[test]
fn test_cascade_invalidates_dependents() {
    let (cache, _dir) = TestCacheBuilder::new().build();

    cache.set("a", 1).unwrap();
    cache
        .set_with("b", 2, EntryOptions::new().depends_on("a"))
        .unwrap();

    assert_eq!(cache.invalidate("a"), 2);
    assert_eq!(cache.get("a", 0), 0);
    assert_eq!(cache.get("b", 0), 0);
    assert_eq!(cache.get_stats().invalidations, 2);
}

#[test]
fn test_transitive_cascade() {
    let (cache, dir) = TestCacheBuilder::new().build();

    cache.set("schema", 1).unwrap();
    cache
        .set_with("table", 2, EntryOptions::new().depends_on("schema"))
        .unwrap();
    cache
        .set_with("view", 3, EntryOptions::new().depends_on("table"))
        .unwrap();
    cache
        .set_with("report", 4, EntryOptions::new().dependencies(["view", "table"]))
        .unwrap();
    cache.set("unrelated", 5).unwrap();

    assert_eq!(cache.invalidate("schema"), 4);
    for key in ["schema", "table", "view", "report"] {
        assert!(!cache.contains(key), "{key} should be gone");
    }
    assert!(cache.contains("unrelated"));
    assert_eq!(index_count(&dir), 0);
}

#[test]
fn test_invalidating_missing_key_returns_zero() {
    let (cache, _dir) = TestCacheBuilder::new().build();
    assert_eq!(cache.invalidate("ghost"), 0);
}

#[test]
fn test_missing_dependency_still_cascades() {
    let (cache, _dir) = TestCacheBuilder::new().build();

    // `config` itself was never cached
    cache
        .set_with("derived", 1, EntryOptions::new().depends_on("config"))
        .unwrap();

    assert_eq!(cache.invalidate("config"), 1);
    assert!(!cache.contains("derived"));
}

#[test]
fn test_cycles_terminate() {
    let (cache, dir) = TestCacheBuilder::new().build();

    cache
        .set_with("a", 1, EntryOptions::new().depends_on("b"))
        .unwrap();
    cache
        .set_with("b", 2, EntryOptions::new().depends_on("a"))
        .unwrap();

    assert_eq!(cache.invalidate("a"), 2);
    assert_eq!(cache.invalidate("a"), 0);
    assert_eq!(index_count(&dir), 0);
}

#[test]
fn test_self_dependency_counts_once() {
    let (cache, _dir) = TestCacheBuilder::new().build();

    cache
        .set_with("loop", 1, EntryOptions::new().depends_on("loop"))
        .unwrap();
    assert_eq!(cache.invalidate("loop"), 1);
}

#[test]
fn test_invalidated_dependent_leaves_index() {
    let (cache, dir) = TestCacheBuilder::new().build();
    let index = DependencyIndex::new(dir.path());

    cache.set("a", 1).unwrap();
    cache
        .set_with("b", 2, EntryOptions::new().depends_on("a"))
        .unwrap();
    cache
        .set_with("c", 3, EntryOptions::new().depends_on("a"))
        .unwrap();
    assert_eq!(index.dependents("a").unwrap().len(), 2);

    assert_eq!(cache.invalidate("b"), 1);
    assert_eq!(
        index.dependents("a").unwrap(),
        BTreeSet::from(["c".to_string()])
    );

    // Only `a` and `c` remain to cascade
    assert_eq!(cache.invalidate("a"), 2);
}

#[test]
fn test_reset_without_dependency_unregisters() {
    let (cache, _dir) = TestCacheBuilder::new().build();

    cache.set("a", 1).unwrap();
    cache
        .set_with("b", 2, EntryOptions::new().depends_on("a"))
        .unwrap();
    cache.set("b", 3).unwrap();

    assert_eq!(cache.invalidate("a"), 1);
    assert_eq!(cache.get("b", 0), 3);
}

#[test]
fn test_reset_after_expiry_drops_stale_dependency() {
    let (cache, _dir) = TestCacheBuilder::new().build();

    cache.set("a", 1).unwrap();
    cache
        .set_with(
            "b",
            2,
            EntryOptions::new()
                .ttl(Duration::from_millis(50))
                .depends_on("a"),
        )
        .unwrap();
    thread::sleep(Duration::from_millis(150));
    assert_eq!(cache.get("b", 0), 0);

    // Stored again with no dependency on `a`
    cache.set("b", 3).unwrap();

    assert_eq!(cache.invalidate("a"), 1);
    assert_eq!(cache.get("b", 0), 3);
}

#[test]
fn test_reset_after_eviction_drops_stale_dependency() {
    let (cache, _dir) = TestCacheBuilder::new()
        .cache_type(CacheType::Memory)
        .capacity(2)
        .build();

    cache
        .set_with("b", 2, EntryOptions::new().depends_on("a"))
        .unwrap();
    cache.set("a", 1).unwrap();
    cache.set("c", 3).unwrap();
    assert_eq!(cache.get("b", 0), 0);

    cache.get("a", 0);
    cache.set("b", 5).unwrap();
    assert!(cache.is_memory_resident("a"));

    assert_eq!(cache.invalidate("a"), 1);
    assert_eq!(cache.get("b", 0), 5);
}

#[test]
fn test_stale_registration_does_not_hide_a_live_path() {
    let (cache, dir) = TestCacheBuilder::new().build();

    cache.set("a", 1).unwrap();
    cache
        .set_with("c", 2, EntryOptions::new().depends_on("a"))
        .unwrap();
    cache
        .set_with(
            "z",
            3,
            EntryOptions::new()
                .ttl(Duration::from_millis(50))
                .depends_on("a"),
        )
        .unwrap();
    thread::sleep(Duration::from_millis(150));
    assert_eq!(cache.get("z", 0), 0);

    // `z` now hangs off `c`, while `a`'s index still names it
    cache
        .set_with("z", 4, EntryOptions::new().depends_on("c"))
        .unwrap();

    assert_eq!(cache.invalidate("a"), 3);
    assert!(!cache.contains("z"));
    assert_eq!(index_count(&dir), 0);
}

#[test]
fn test_remove_does_not_cascade() {
    let (cache, _dir) = TestCacheBuilder::new().build();

    cache.set("a", 1).unwrap();
    cache
        .set_with("b", 2, EntryOptions::new().depends_on("a"))
        .unwrap();

    cache.remove("a");
    assert_eq!(cache.get("b", 0), 2);

    // The index survived the remove
    assert_eq!(cache.invalidate("a"), 1);
    assert_eq!(cache.get("b", 0), 0);
}

#[test]
fn test_cascade_in_memory_only_cache() {
    let (cache, _dir) = TestCacheBuilder::new()
        .cache_type(CacheType::Memory)
        .build();

    cache.set("a", 1).unwrap();
    cache
        .set_with("b", 2, EntryOptions::new().depends_on("a"))
        .unwrap();

    assert_eq!(cache.invalidate("a"), 2);
    assert_eq!(cache.get("b", 0), 0);
}

#[test]
fn test_cascade_reaches_entries_only_on_disk() {
    let (cache, _dir) = TestCacheBuilder::new().capacity(1).build();

    cache.set("a", 1).unwrap();
    cache
        .set_with("b", 2, EntryOptions::new().depends_on("a"))
        .unwrap();
    assert!(!cache.is_memory_resident("a"));

    assert_eq!(cache.invalidate("a"), 2);
    assert!(!cache.contains("a"));
    assert!(!cache.contains("b"));
}

const KEYS: usize = 6;

fn key(i: usize) -> String {
    format!("k{i}")
}

/// Keys whose dependency chains lead back to `root`
fn reachable(edges: &[Vec<usize>], root: usize) -> BTreeSet<usize> {
    let mut seen = BTreeSet::from([root]);
    let mut queue = VecDeque::from([root]);
    while let Some(current) = queue.pop_front() {
        for (dependent, dependencies) in edges.iter().enumerate() {
            if dependencies.contains(&current) && seen.insert(dependent) {
                queue.push_back(dependent);
            }
        }
    }
    seen
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn invalidate_removes_exactly_the_reachable_set(
        edges in prop::collection::vec(prop::collection::vec(0..KEYS, 0..3), KEYS),
        root in 0..KEYS,
    ) {
        let (cache, _dir) = TestCacheBuilder::new().build();
        for (i, dependencies) in edges.iter().enumerate() {
            let options = EntryOptions::new().dependencies(dependencies.iter().map(|&d| key(d)));
            cache.set_with(&key(i), i, options).unwrap();
        }

        let expected = reachable(&edges, root);
        prop_assert_eq!(cache.invalidate(&key(root)), expected.len());

        for i in 0..KEYS {
            prop_assert_eq!(cache.contains(&key(i)), !expected.contains(&i));
        }
    }
}
