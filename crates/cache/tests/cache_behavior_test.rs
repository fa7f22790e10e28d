//! Integration tests for get/set/remove semantics across cache types

mod common;

use common::{blob_count, TestCacheBuilder};
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;
use tiercache::{CacheError, CacheType, EntryOptions, EvictionPolicyKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Artifact {
    name: String,
    size: u64,
    tags: Vec<String>,
}

#[test]
fn test_round_trip() {
    let (cache, _dir) = TestCacheBuilder::new().build();

    let artifact = Artifact {
        name: "libfoo.a".to_string(),
        size: 4096,
        tags: vec!["release".to_string()],
    };
    let returned = cache.set("artifact", artifact.clone()).unwrap();
    assert_eq!(returned, artifact);

    let fallback = Artifact {
        name: String::new(),
        size: 0,
        tags: vec![],
    };
    assert_eq!(cache.get("artifact", fallback), artifact);
    assert_eq!(cache.get_stats().memory_hits, 1);
}

#[test]
fn test_missing_key_returns_default() {
    let (cache, _dir) = TestCacheBuilder::new().build();

    assert_eq!(cache.get("nope", 7u32), 7);
    assert_eq!(cache.try_get::<u32>("nope"), None);

    let stats = cache.get_stats();
    assert_eq!(stats.memory_misses, 2);
    assert_eq!(stats.disk_misses, 2);
}

#[test]
fn test_ttl_expiry() {
    let (cache, dir) = TestCacheBuilder::new().build();

    cache
        .set_with("short", 1u8, EntryOptions::new().ttl(Duration::from_millis(500)))
        .unwrap();
    assert_eq!(cache.get("short", 0u8), 1);

    thread::sleep(Duration::from_millis(700));

    assert_eq!(cache.get("short", 0u8), 0);
    let stats = cache.get_stats();
    assert_eq!(stats.memory_misses, 1);
    assert_eq!(stats.disk_misses, 1);
    // Expired blobs are removed lazily
    assert_eq!(blob_count(&dir), 0);
}

#[test]
fn test_default_ttl_applies() {
    let (cache, _dir) = TestCacheBuilder::new()
        .with(|c| c.default_ttl(Duration::from_millis(30)))
        .build();

    cache.set("k", "v").unwrap();
    thread::sleep(Duration::from_millis(80));
    assert!(!cache.contains("k"));
}

#[test]
fn test_lru_eviction_falls_back_to_disk() {
    let (cache, _dir) = TestCacheBuilder::new().capacity(2).build();

    cache.set("a", 1).unwrap();
    cache.set("b", 2).unwrap();
    assert_eq!(cache.get("a", 0), 1);
    cache.set("c", 3).unwrap();

    assert!(!cache.is_memory_resident("b"));
    assert!(cache.is_memory_resident("a"));
    assert!(cache.is_memory_resident("c"));
    assert_eq!(cache.get_stats().evictions, 1);

    // Still on disk, and promoted back on access
    assert_eq!(cache.get("b", 0), 2);
    assert_eq!(cache.get_stats().disk_hits, 1);
    assert!(cache.is_memory_resident("b"));
}

#[test]
fn test_lru_eviction_in_memory_only_cache_loses_entry() {
    let (cache, _dir) = TestCacheBuilder::new()
        .cache_type(CacheType::Memory)
        .capacity(2)
        .build();

    cache.set("a", 1).unwrap();
    cache.set("b", 2).unwrap();
    cache.set("c", 3).unwrap();

    assert_eq!(cache.get("a", 0), 0);
    assert_eq!(cache.get("b", 0), 2);
}

#[test]
fn test_fifo_scenario() {
    let (cache, _dir) = TestCacheBuilder::new()
        .cache_type(CacheType::Memory)
        .policy(EvictionPolicyKind::Fifo)
        .capacity(2)
        .build();

    cache.set("a", 1).unwrap();
    cache.set("b", 2).unwrap();
    cache.set("c", 3).unwrap();

    assert_eq!(cache.get("a", -1), -1);
    assert_eq!(cache.get("b", -1), 2);
    assert_eq!(cache.get("c", -1), 3);
}

#[test]
fn test_fifo_ignores_access_order() {
    let (cache, _dir) = TestCacheBuilder::new()
        .policy(EvictionPolicyKind::Fifo)
        .capacity(2)
        .build();

    cache.set("a", 1).unwrap();
    cache.set("b", 2).unwrap();
    // Touching `a` does not save it under FIFO
    assert_eq!(cache.get("a", 0), 1);
    cache.set("c", 3).unwrap();

    assert!(!cache.is_memory_resident("a"));
    assert!(cache.is_memory_resident("b"));
}

#[test]
fn test_lfu_keeps_frequent_entries() {
    let (cache, _dir) = TestCacheBuilder::new()
        .policy(EvictionPolicyKind::Lfu)
        .capacity(2)
        .build();

    cache.set("hot", 1).unwrap();
    cache.set("cold", 2).unwrap();
    for _ in 0..3 {
        cache.get("hot", 0);
    }
    cache.get("cold", 0);
    cache.set("new", 3).unwrap();

    assert!(cache.is_memory_resident("hot"));
    assert!(!cache.is_memory_resident("cold"));
}

#[test]
fn test_overwrite_replaces_value() {
    let (cache, _dir) = TestCacheBuilder::new().capacity(2).build();

    cache.set("k", "one").unwrap();
    cache.set("k", "two").unwrap();

    assert_eq!(cache.get("k", String::new()), "two");
    assert_eq!(cache.memory_len(), 1);
    assert_eq!(cache.get_stats().evictions, 0);
}

#[test]
fn test_remove_is_idempotent() {
    let (cache, dir) = TestCacheBuilder::new().build();

    cache.set("k", 1).unwrap();
    cache.remove("k");
    cache.remove("k");
    cache.remove("never-existed");

    assert!(!cache.contains("k"));
    assert_eq!(blob_count(&dir), 0);
}

#[test]
fn test_empty_key_is_rejected() {
    let (cache, _dir) = TestCacheBuilder::new().build();

    let err = cache.set("", 1).unwrap_err();
    assert!(matches!(err, CacheError::InvalidKey { .. }));
    assert_eq!(cache.get("", 5), 5);
}

#[test]
fn test_unencodable_value_is_rejected() {
    let (cache, dir) = TestCacheBuilder::new().build();

    let value = std::collections::HashMap::from([(vec![1u8], 1u8)]);
    let err = cache.set("k", value).unwrap_err();
    assert!(matches!(err, CacheError::Serialization { .. }));
    assert!(!cache.contains("k"));
    assert_eq!(blob_count(&dir), 0);
}

#[test]
fn test_type_mismatch_returns_default() {
    let (cache, _dir) = TestCacheBuilder::new().build();

    cache.set("k", "text").unwrap();
    assert_eq!(cache.get("k", 9u64), 9);
    assert_eq!(cache.get("k", String::new()), "text");
}

#[test]
fn test_memory_only_writes_no_blobs() {
    let (cache, dir) = TestCacheBuilder::new()
        .cache_type(CacheType::Memory)
        .build();

    cache.set("k", 1).unwrap();
    assert_eq!(cache.get("k", 0), 1);
    assert_eq!(blob_count(&dir), 0);

    let stats = cache.get_stats();
    assert_eq!(stats.memory_hits, 1);
    assert_eq!(stats.disk_hits + stats.disk_misses, 0);
}

#[test]
fn test_disk_only_never_populates_memory() {
    let (cache, dir) = TestCacheBuilder::new().cache_type(CacheType::Disk).build();

    cache.set("k", 1).unwrap();
    assert_eq!(cache.get("k", 0), 1);
    assert_eq!(blob_count(&dir), 1);
    assert!(!cache.is_memory_resident("k"));

    let stats = cache.get_stats();
    assert_eq!(stats.disk_hits, 1);
    assert_eq!(stats.memory_hits + stats.memory_misses, 0);
}

#[test]
fn test_clear_wipes_everything_and_resets_stats() {
    let (cache, dir) = TestCacheBuilder::new().build();

    cache.set("a", 1).unwrap();
    cache
        .set_with("b", 2, EntryOptions::new().depends_on("a"))
        .unwrap();
    cache.get("a", 0);
    cache.get("missing", 0);

    cache.clear();

    let stats = cache.get_stats();
    assert_eq!(stats.hits(), 0);
    assert_eq!(stats.memory_misses, 0);
    assert_eq!(blob_count(&dir), 0);
    assert_eq!(common::index_count(&dir), 0);
    assert_eq!(cache.memory_len(), 0);
    assert_eq!(cache.get("a", 0), 0);
}

#[test]
fn test_contains_has_no_side_effects() {
    let (cache, _dir) = TestCacheBuilder::new().build();

    cache.set("k", 1).unwrap();
    assert!(cache.contains("k"));
    assert!(!cache.contains("other"));

    let stats = cache.get_stats();
    assert_eq!(stats.hits() + stats.memory_misses + stats.disk_misses, 0);
}

#[test]
fn test_contains_does_not_refresh_memory_recency() {
    let (cache, _dir) = TestCacheBuilder::new().capacity(2).build();

    cache.set("a", 1).unwrap();
    cache.set("b", 2).unwrap();
    // A `get` here would save `a`; `contains` must not
    assert!(cache.contains("a"));
    cache.set("c", 3).unwrap();

    assert!(!cache.is_memory_resident("a"));
    assert!(cache.is_memory_resident("b"));
    assert!(cache.contains("a"));
}

#[test]
fn test_partition_of_is_stable() {
    let (first, _a) = TestCacheBuilder::new().with(|c| c.partition_count(16)).build();
    let (second, _b) = TestCacheBuilder::new().with(|c| c.partition_count(16)).build();

    for key in ["abc", "build/x86_64", "", "ünïcode"] {
        assert_eq!(first.partition_of(key), second.partition_of(key));
        assert!(first.partition_of(key) < 16);
    }
    assert_eq!(first.partition_of("abc"), 10);
}
