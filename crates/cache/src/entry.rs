//! Cache entry type shared by both tiers

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::{Duration, SystemTime};

/// Upper bound used when `created_at + ttl` overflows
const MAX_LIFETIME: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// A cached value with its lifetime and bookkeeping
///
/// The payload is opaque bytes produced by the cache's codec. The same
/// structure is held in memory and persisted (inside a blob envelope) on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: Vec<u8>,
    pub created_at: SystemTime,
    pub expires_at: SystemTime,
    pub ttl: Duration,
    /// Hits while memory-resident; drives LFU
    pub access_count: u64,
    /// Keys whose invalidation cascades to this entry
    pub dependencies: BTreeSet<String>,
}

impl CacheEntry {
    pub fn new(
        key: impl Into<String>,
        value: Vec<u8>,
        ttl: Duration,
        dependencies: BTreeSet<String>,
    ) -> Self {
        Self::created_at(key, value, ttl, dependencies, SystemTime::now())
    }

    pub fn created_at(
        key: impl Into<String>,
        value: Vec<u8>,
        ttl: Duration,
        dependencies: BTreeSet<String>,
        created_at: SystemTime,
    ) -> Self {
        let expires_at = created_at
            .checked_add(ttl)
            .unwrap_or_else(|| created_at + MAX_LIFETIME);

        Self {
            key: key.into(),
            value,
            created_at,
            expires_at,
            ttl,
            access_count: 0,
            dependencies,
        }
    }

    #[inline]
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(SystemTime::now())
    }

    pub fn record_access(&mut self) {
        self.access_count = self.access_count.saturating_add(1);
    }
}
