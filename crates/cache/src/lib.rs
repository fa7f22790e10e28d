//! Hybrid memory/disk cache shared between processes
//!
//! This crate provides a caching engine with:
//! - Hash-partitioned memory tier with LRU, LFU or FIFO eviction
//! - Disk tier of checksummed blobs, bounded by a size sweep
//! - Advisory file locks coordinating processes that share a cache root
//! - Cascade invalidation through a disk-resident dependency index
//! - Access-pattern driven preloading
//!
//! ```no_run
//! use tiercache::{Cache, CacheConfig, EntryOptions};
//!
//! # fn main() -> tiercache::Result<()> {
//! let cache = Cache::open("/tmp/tiercache", CacheConfig::default())?;
//! cache.set("schema", 3u32)?;
//! cache.set_with("report", "ok", EntryOptions::new().depends_on("schema"))?;
//!
//! assert_eq!(cache.invalidate("schema"), 2);
//! assert_eq!(cache.get("report", String::from("missing")), "missing");
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod core;
pub mod deps;
pub mod disk;
pub mod entry;
pub mod errors;
pub mod eviction;
pub mod lock;
pub mod memory;
pub mod partition;
pub mod patterns;
pub mod stats;

pub use codec::{BincodeCodec, Codec, JsonCodec};
pub use config::{
    CacheConfig, CacheConfigBuilder, CacheType, ConfigSource, EvictionPolicyKind, PatternStoreKind,
};
pub use crate::core::{Cache, CacheBuilder, EntryOptions, SweepReport};
pub use entry::CacheEntry;
pub use errors::{CacheError, Error, RecoveryHint, Result};
pub use partition::{key_digest, PartitionRouter};
pub use patterns::{AccessPattern, PatternStore};
pub use stats::StatsSnapshot;
