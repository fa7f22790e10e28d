//! Pattern store implementations

use super::table::{AccessPattern, PatternTable};
use super::PatternStore;
use crate::errors::{CacheError, Result};
use crate::lock::{GlobalLock, LockManager, LockScope};
use parking_lot::Mutex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tiercache_utils::{remove_if_exists, write_atomic};

/// Name of the shared pattern file inside the cache root
pub const PATTERNS_FILE_NAME: &str = "patterns.json";

/// Patterns private to this process
#[derive(Debug)]
pub struct MemoryPatternStore {
    window: Duration,
    table: Mutex<PatternTable>,
}

impl MemoryPatternStore {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            table: Mutex::new(PatternTable::default()),
        }
    }
}

impl PatternStore for MemoryPatternStore {
    fn record_access(&self, key: &str, now: SystemTime) -> Result<()> {
        self.table.lock().record(key, now, self.window);
        Ok(())
    }

    fn ranked_neighbours(&self, key: &str) -> Result<Vec<(String, u64)>> {
        Ok(self.table.lock().ranked(key))
    }

    fn pattern(&self, key: &str) -> Result<Option<AccessPattern>> {
        Ok(self.table.lock().get(key).cloned())
    }

    fn clear(&self) -> Result<()> {
        self.table.lock().clear();
        Ok(())
    }
}

/// Patterns shared by every process using the cache root
///
/// The table lives in `<root>/patterns.json` and every update is a
/// read-modify-write under the global patterns lock. An unreadable file is
/// discarded and the table starts over.
#[derive(Debug)]
pub struct FilePatternStore {
    path: PathBuf,
    locks: LockManager,
    window: Duration,
}

impl FilePatternStore {
    pub fn new(root: &Path, locks: LockManager, window: Duration) -> Self {
        Self {
            path: root.join(PATTERNS_FILE_NAME),
            locks,
            window,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<PatternTable> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(PatternTable::default()),
            Err(e) => return Err(CacheError::io(&self.path, "read access patterns", e)),
        };

        match serde_json::from_slice(&content) {
            Ok(table) => Ok(table),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "discarding unreadable access pattern file"
                );
                Ok(PatternTable::default())
            }
        }
    }

    fn store(&self, table: &PatternTable) -> Result<()> {
        let content =
            serde_json::to_vec(table).map_err(|e| CacheError::encode(PATTERNS_FILE_NAME, e))?;
        write_atomic(&self.path, &content)
            .map_err(|e| CacheError::io(&self.path, "write access patterns", e))
    }
}

impl PatternStore for FilePatternStore {
    fn record_access(&self, key: &str, now: SystemTime) -> Result<()> {
        let _lock = self.locks.acquire(LockScope::Global(GlobalLock::Patterns))?;
        let mut table = self.load()?;
        table.record(key, now, self.window);
        self.store(&table)
    }

    fn ranked_neighbours(&self, key: &str) -> Result<Vec<(String, u64)>> {
        // Whole-file replacement keeps unlocked reads consistent
        Ok(self.load()?.ranked(key))
    }

    fn pattern(&self, key: &str) -> Result<Option<AccessPattern>> {
        Ok(self.load()?.get(key).cloned())
    }

    fn clear(&self) -> Result<()> {
        let _lock = self.locks.acquire(LockScope::Global(GlobalLock::Patterns))?;
        remove_if_exists(&self.path)
            .map(|_| ())
            .map_err(|e| CacheError::io(&self.path, "remove access patterns", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const WINDOW: Duration = Duration::from_secs(5);

    fn file_store(dir: &TempDir) -> FilePatternStore {
        let locks = LockManager::new(dir.path(), Duration::from_millis(50)).unwrap();
        FilePatternStore::new(dir.path(), locks, WINDOW)
    }

    #[test]
    fn test_memory_store_records_and_clears() {
        let store = MemoryPatternStore::new(WINDOW);
        let now = SystemTime::now();
        store.record_access("x", now).unwrap();
        store.record_access("y", now).unwrap();

        assert_eq!(store.ranked_neighbours("y").unwrap(), vec![("x".to_string(), 1)]);

        store.clear().unwrap();
        assert!(store.pattern("y").unwrap().is_none());
    }

    #[test]
    fn test_file_store_is_shared_between_instances() {
        let temp_dir = TempDir::new().unwrap();
        let first = file_store(&temp_dir);
        let second = file_store(&temp_dir);
        let now = SystemTime::now();

        first.record_access("x", now).unwrap();
        second.record_access("y", now).unwrap();

        assert_eq!(first.ranked_neighbours("y").unwrap(), vec![("x".to_string(), 1)]);
        assert_eq!(second.pattern("x").unwrap().unwrap().access_count, 1);

        second.clear().unwrap();
        assert!(!first.path().exists());
        assert!(first.ranked_neighbours("y").unwrap().is_empty());
    }

    #[test]
    fn test_file_store_recovers_from_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let store = file_store(&temp_dir);
        fs::write(store.path(), b"\x00garbage").unwrap();

        assert!(store.ranked_neighbours("x").unwrap().is_empty());
        store.record_access("x", SystemTime::now()).unwrap();
        assert!(store.pattern("x").unwrap().is_some());
    }

    #[test]
    fn test_file_store_reports_lock_timeout() {
        let temp_dir = TempDir::new().unwrap();
        let store = file_store(&temp_dir);
        let locks = LockManager::new(temp_dir.path(), Duration::from_millis(50)).unwrap();

        let _held = locks.acquire(LockScope::Global(GlobalLock::Patterns)).unwrap();
        let err = store.record_access("x", SystemTime::now()).unwrap_err();
        assert!(matches!(err, CacheError::LockTimeout { .. }));
    }
}
