//! Distributed (cross-process) lock layer
//!
//! Every lock is an advisory file lock under `<root>/locks/`. Per-key and
//! dependency-index locks wait at most `lock_timeout`; callers treat a timeout
//! as a signal to continue with only their in-process partition lock. The
//! sweep lock is try-only.
//!
//! Mutual exclusion here is best effort: a writer that degraded after a
//! timeout runs concurrently with the holder, and cross-process writes to the
//! same key are ordered only by the filesystem.

use crate::errors::{CacheError, Result};
use crate::partition::key_digest;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tiercache_utils::FileLock;

/// Name of the lock directory inside the cache root
pub const LOCK_DIR_NAME: &str = "locks";

/// Named locks that span the whole cache root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalLock {
    /// Disk-size sweep
    Sweep,
    /// `clear()`
    Clear,
    /// Shared access-pattern file
    Patterns,
}

impl GlobalLock {
    fn file_name(self) -> &'static str {
        match self {
            Self::Sweep => "global-sweep.lock",
            Self::Clear => "global-clear.lock",
            Self::Patterns => "global-patterns.lock",
        }
    }
}

/// What a lock protects
#[derive(Debug, Clone, Copy)]
pub enum LockScope<'a> {
    /// A key's blob
    Key(&'a str),
    /// The reverse-dependency file of a key
    DependencyIndex(&'a str),
    /// A named global lock
    Global(GlobalLock),
}

impl LockScope<'_> {
    fn describe(&self) -> String {
        match self {
            Self::Key(key) => format!("key:{key}"),
            Self::DependencyIndex(key) => format!("deps:{key}"),
            Self::Global(lock) => lock.file_name().to_string(),
        }
    }
}

/// Hands out advisory locks rooted at a cache directory
#[derive(Debug, Clone)]
pub struct LockManager {
    dir: PathBuf,
    timeout: Duration,
}

impl LockManager {
    /// Create the lock directory under `root`
    pub fn new(root: &Path, timeout: Duration) -> Result<Self> {
        let dir = root.join(LOCK_DIR_NAME);
        fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, "create lock directory", e))?;
        Ok(Self { dir, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Lock file backing a scope
    pub fn lock_path(&self, scope: LockScope<'_>) -> PathBuf {
        match scope {
            LockScope::Key(key) => self.dir.join(format!("{}.lock", key_digest(key))),
            LockScope::DependencyIndex(key) => self
                .dir
                .join(format!("{}.lock", key_digest(&format!("deps:{key}")))),
            LockScope::Global(lock) => self.dir.join(lock.file_name()),
        }
    }

    /// Acquire a lock, waiting at most the configured timeout
    pub fn acquire(&self, scope: LockScope<'_>) -> Result<FileLock> {
        let path = self.lock_path(scope);
        FileLock::acquire_timeout(&path, self.timeout).map_err(|e| match e.kind() {
            io::ErrorKind::TimedOut => CacheError::LockTimeout {
                name: scope.describe(),
                waited: self.timeout,
            },
            _ => CacheError::io(&path, "acquire distributed lock", e),
        })
    }

    /// Acquire a lock only if nobody holds it
    ///
    /// `Ok(None)` means the lock is busy.
    pub fn try_acquire(&self, scope: LockScope<'_>) -> Result<Option<FileLock>> {
        let path = self.lock_path(scope);
        match FileLock::try_acquire(&path) {
            Ok(lock) => Ok(Some(lock)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(CacheError::io(&path, "acquire distributed lock", e)),
        }
    }
}
