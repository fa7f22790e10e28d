//! Cache configuration with on-disk overlay
//!
//! A [`CacheConfig`] is built by the caller and then, once at construction,
//! overlaid with `<root>/tiercache.json` when that file exists. Any failure to
//! read or interpret the file leaves the caller's configuration untouched.

use crate::errors::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Name of the optional configuration file inside the cache root
pub const CONFIG_FILE_NAME: &str = "tiercache.json";

/// Which tiers are active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheType {
    Memory,
    Disk,
    #[default]
    Hybrid,
}

impl CacheType {
    pub fn uses_memory(self) -> bool {
        matches!(self, Self::Memory | Self::Hybrid)
    }

    pub fn uses_disk(self) -> bool {
        matches!(self, Self::Disk | Self::Hybrid)
    }
}

impl fmt::Display for CacheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Disk => write!(f, "disk"),
            Self::Hybrid => write!(f, "hybrid"),
        }
    }
}

impl FromStr for CacheType {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "disk" => Ok(Self::Disk),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(CacheError::configuration(format!(
                "unknown cache type: {other}"
            ))),
        }
    }
}

/// Victim selection rule for a full tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicyKind {
    #[default]
    Lru,
    Lfu,
    Fifo,
}

impl fmt::Display for EvictionPolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lru => write!(f, "lru"),
            Self::Lfu => write!(f, "lfu"),
            Self::Fifo => write!(f, "fifo"),
        }
    }
}

impl FromStr for EvictionPolicyKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "lru" => Ok(Self::Lru),
            "lfu" => Ok(Self::Lfu),
            "fifo" => Ok(Self::Fifo),
            other => Err(CacheError::configuration(format!(
                "unknown eviction policy: {other}"
            ))),
        }
    }
}

/// Where access-pattern records live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternStoreKind {
    /// Private to this process
    #[default]
    Memory,
    /// A file in the cache root, shared by every process using it
    Shared,
}

impl fmt::Display for PatternStoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Shared => write!(f, "shared"),
        }
    }
}

impl FromStr for PatternStoreKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "shared" => Ok(Self::Shared),
            other => Err(CacheError::configuration(format!(
                "unknown pattern store: {other}"
            ))),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheConfig {
    /// Active tiers
    pub cache_type: CacheType,
    /// Maximum number of in-memory entries, split evenly across partitions
    pub max_memory_size: usize,
    /// Maximum bytes of entry blobs on disk before a sweep runs
    pub max_disk_size: u64,
    /// TTL applied when `set` does not supply one
    #[serde(with = "duration_secs")]
    pub default_ttl: Duration,
    /// Victim selection rule for both tiers
    pub eviction_policy: EvictionPolicyKind,
    /// Number of memory partitions
    pub partition_count: usize,
    /// Fraction of ranked co-accessed keys preloaded after a hit
    pub preload_factor: f64,
    /// Bound on waiting for a distributed lock
    #[serde(with = "duration_secs")]
    pub lock_timeout: Duration,
    /// Trailing window in which accesses count as co-occurring
    #[serde(with = "duration_secs")]
    pub access_window: Duration,
    /// Payloads larger than this many bytes are compressed on disk
    pub compression_threshold: usize,
    /// Where access-pattern records live
    pub pattern_store: PatternStoreKind,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: CacheType::Hybrid,
            max_memory_size: 1000,
            max_disk_size: 100 * 1024 * 1024, // 100MB
            default_ttl: Duration::from_secs(3600),
            eviction_policy: EvictionPolicyKind::Lru,
            partition_count: 16,
            preload_factor: 0.2,
            lock_timeout: Duration::from_secs(1),
            access_window: Duration::from_secs(5),
            compression_threshold: 4096,
            pattern_store: PatternStoreKind::Memory,
        }
    }
}

impl CacheConfig {
    /// Start a builder from the defaults
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::new()
    }

    /// Entries each partition may hold before it evicts
    pub fn per_partition_capacity(&self) -> usize {
        (self.max_memory_size / self.partition_count.max(1)).max(1)
    }

    /// Clamp values into their usable ranges
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.partition_count = self.partition_count.max(1);
        if !self.preload_factor.is_finite() || self.preload_factor <= 0.0 {
            self.preload_factor = f64::MIN_POSITIVE;
        }
        self.preload_factor = self.preload_factor.min(1.0);
        self
    }

    /// Overlay `<root>/tiercache.json` onto this configuration
    ///
    /// Returns the configuration to use and where it came from. Never fails:
    /// an unreadable or invalid file is logged and ignored.
    pub fn overlay_from_dir(self, root: &Path) -> (Self, ConfigSource) {
        let path = root.join(CONFIG_FILE_NAME);

        match ConfigOverlay::load(&path) {
            Ok(None) => (self.normalized(), ConfigSource::Constructor),
            Ok(Some(overlay)) => match overlay.apply(self.clone()) {
                Ok(config) => {
                    tracing::debug!(path = %path.display(), "applied cache configuration file");
                    (config.normalized(), ConfigSource::File(path))
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "ignoring invalid cache configuration file"
                    );
                    (self.normalized(), ConfigSource::Constructor)
                }
            },
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to load cache configuration file, using constructor settings"
                );
                (self.normalized(), ConfigSource::Constructor)
            }
        }
    }
}

/// Source of the effective configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Settings supplied by the caller
    Constructor,
    /// Caller settings overridden by a configuration file
    File(PathBuf),
}

/// Partial configuration read from disk; every field is optional
#[derive(Debug, Default, Deserialize)]
struct ConfigOverlay {
    cache_type: Option<String>,
    max_memory_size: Option<usize>,
    max_disk_size: Option<u64>,
    default_ttl: Option<f64>,
    eviction_policy: Option<String>,
    partition_count: Option<usize>,
    preload_factor: Option<f64>,
    lock_timeout: Option<f64>,
    access_window: Option<f64>,
    compression_threshold: Option<usize>,
    pattern_store: Option<String>,
}

impl ConfigOverlay {
    fn load(path: &Path) -> Result<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(path, "read configuration file", e)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| CacheError::configuration(format!("malformed {CONFIG_FILE_NAME}: {e}")))
    }

    /// Apply every present field, failing on the first invalid one
    fn apply(self, mut config: CacheConfig) -> Result<CacheConfig> {
        if let Some(value) = self.cache_type {
            config.cache_type = value.parse()?;
        }
        if let Some(value) = self.max_memory_size {
            config.max_memory_size = value;
        }
        if let Some(value) = self.max_disk_size {
            config.max_disk_size = value;
        }
        if let Some(value) = self.default_ttl {
            config.default_ttl = seconds("default_ttl", value)?;
        }
        if let Some(value) = self.eviction_policy {
            config.eviction_policy = value.parse()?;
        }
        if let Some(value) = self.partition_count {
            if value == 0 {
                return Err(CacheError::configuration("partition_count must be at least 1"));
            }
            config.partition_count = value;
        }
        if let Some(value) = self.preload_factor {
            if !(value > 0.0 && value <= 1.0) {
                return Err(CacheError::configuration(format!(
                    "preload_factor must be in (0, 1], got {value}"
                )));
            }
            config.preload_factor = value;
        }
        if let Some(value) = self.lock_timeout {
            config.lock_timeout = seconds("lock_timeout", value)?;
        }
        if let Some(value) = self.access_window {
            config.access_window = seconds("access_window", value)?;
        }
        if let Some(value) = self.compression_threshold {
            config.compression_threshold = value;
        }
        if let Some(value) = self.pattern_store {
            config.pattern_store = value.parse()?;
        }
        Ok(config)
    }
}

fn seconds(field: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        CacheError::configuration(format!(
            "{field} must be a non-negative number of seconds, got {value}"
        ))
    })
}

/// Serialize durations as fractional seconds
mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }
}

/// Builder for creating cache configurations
#[derive(Debug, Clone, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_type(mut self, cache_type: CacheType) -> Self {
        self.config.cache_type = cache_type;
        self
    }

    pub fn max_memory_size(mut self, entries: usize) -> Self {
        self.config.max_memory_size = entries;
        self
    }

    pub fn max_disk_size(mut self, bytes: u64) -> Self {
        self.config.max_disk_size = bytes;
        self
    }

    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.config.default_ttl = ttl;
        self
    }

    pub fn eviction_policy(mut self, policy: EvictionPolicyKind) -> Self {
        self.config.eviction_policy = policy;
        self
    }

    pub fn partition_count(mut self, partitions: usize) -> Self {
        self.config.partition_count = partitions;
        self
    }

    pub fn preload_factor(mut self, factor: f64) -> Self {
        self.config.preload_factor = factor;
        self
    }

    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.config.lock_timeout = timeout;
        self
    }

    pub fn access_window(mut self, window: Duration) -> Self {
        self.config.access_window = window;
        self
    }

    pub fn compression_threshold(mut self, bytes: usize) -> Self {
        self.config.compression_threshold = bytes;
        self
    }

    pub fn pattern_store(mut self, store: PatternStoreKind) -> Self {
        self.config.pattern_store = store;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CacheConfig {
        self.config
    }
}
