//! Stats accumulator
//!
//! Counters are per process. Increments share a read gate so that
//! [`CacheStats::snapshot`] and [`CacheStats::reset`], which take the write
//! side, never observe or produce a torn set of counters.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

/// Cache statistics with atomic counters
#[derive(Debug)]
pub struct CacheStats {
    gate: RwLock<SystemTime>,
    memory_hits: AtomicU64,
    memory_misses: AtomicU64,
    disk_hits: AtomicU64,
    disk_misses: AtomicU64,
    evictions: AtomicU64,
    preloads: AtomicU64,
    invalidations: AtomicU64,
    lock_contentions: AtomicU64,
    io_errors: AtomicU64,
}

impl Default for CacheStats {
    fn default() -> Self {
        Self {
            gate: RwLock::new(SystemTime::now()),
            memory_hits: AtomicU64::new(0),
            memory_misses: AtomicU64::new(0),
            disk_hits: AtomicU64::new(0),
            disk_misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            preloads: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
            lock_contentions: AtomicU64::new(0),
            io_errors: AtomicU64::new(0),
        }
    }
}

impl CacheStats {
    #[inline]
    fn bump(&self, counter: &AtomicU64, n: u64) {
        let _gate = self.gate.read();
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_memory_hit(&self) {
        self.bump(&self.memory_hits, 1);
    }

    pub fn record_memory_miss(&self) {
        self.bump(&self.memory_misses, 1);
    }

    pub fn record_disk_hit(&self) {
        self.bump(&self.disk_hits, 1);
    }

    pub fn record_disk_miss(&self) {
        self.bump(&self.disk_misses, 1);
    }

    pub fn record_evictions(&self, n: u64) {
        if n > 0 {
            self.bump(&self.evictions, n);
        }
    }

    pub fn record_preload(&self) {
        self.bump(&self.preloads, 1);
    }

    pub fn record_invalidations(&self, n: u64) {
        if n > 0 {
            self.bump(&self.invalidations, n);
        }
    }

    pub fn record_lock_contention(&self) {
        self.bump(&self.lock_contentions, 1);
    }

    pub fn record_io_error(&self) {
        self.bump(&self.io_errors, 1);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> StatsSnapshot {
        let since = self.gate.write();
        StatsSnapshot {
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            memory_misses: self.memory_misses.load(Ordering::Relaxed),
            disk_hits: self.disk_hits.load(Ordering::Relaxed),
            disk_misses: self.disk_misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            preloads: self.preloads.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            lock_contentions: self.lock_contentions.load(Ordering::Relaxed),
            io_errors: self.io_errors.load(Ordering::Relaxed),
            stats_since: *since,
        }
    }

    /// Zero every counter at once
    pub fn reset(&self) {
        let mut since = self.gate.write();
        for counter in [
            &self.memory_hits,
            &self.memory_misses,
            &self.disk_hits,
            &self.disk_misses,
            &self.evictions,
            &self.preloads,
            &self.invalidations,
            &self.lock_contentions,
            &self.io_errors,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        *since = SystemTime::now();
    }
}

/// Counters returned by `get_stats`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub memory_hits: u64,
    pub memory_misses: u64,
    pub disk_hits: u64,
    pub disk_misses: u64,
    pub evictions: u64,
    pub preloads: u64,
    pub invalidations: u64,
    pub lock_contentions: u64,
    pub io_errors: u64,
    /// When counting started (construction or last `clear`)
    pub stats_since: SystemTime,
}

impl StatsSnapshot {
    /// Lookups answered by either tier
    pub fn hits(&self) -> u64 {
        self.memory_hits + self.disk_hits
    }

    /// Fraction of lookups that hit either tier
    ///
    /// A memory miss that is then answered by disk counts once, as a hit.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let lookups = hits + self.final_misses();
        if lookups == 0 {
            0.0
        } else {
            hits as f64 / lookups as f64
        }
    }

    // Misses that no tier answered: disk misses, or memory misses when
    // disk was never consulted.
    fn final_misses(&self) -> u64 {
        let fell_through = self.disk_hits + self.disk_misses;
        self.disk_misses + self.memory_misses.saturating_sub(fell_through)
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "memory hits:      {}", self.memory_hits)?;
        writeln!(f, "memory misses:    {}", self.memory_misses)?;
        writeln!(f, "disk hits:        {}", self.disk_hits)?;
        writeln!(f, "disk misses:      {}", self.disk_misses)?;
        writeln!(f, "evictions:        {}", self.evictions)?;
        writeln!(f, "preloads:         {}", self.preloads)?;
        writeln!(f, "invalidations:    {}", self.invalidations)?;
        writeln!(f, "lock contentions: {}", self.lock_contentions)?;
        writeln!(f, "io errors:        {}", self.io_errors)?;
        write!(f, "hit rate:         {:.1}%", self.hit_rate() * 100.0)
    }
}
