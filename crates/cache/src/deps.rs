//! Disk-resident reverse-dependency index
//!
//! For every key that something depends on, `<sha256("deps:" + key)>.deps`
//! lists the keys that declared the dependency. Callers hold the
//! dependency-index lock of `dependency` around every read-modify-write.

use crate::errors::{CacheError, Result};
use crate::partition::key_digest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tiercache_utils::{remove_if_exists, write_atomic};

/// Extension of reverse-dependency files
pub const DEPS_EXTENSION: &str = "deps";

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexFile {
    key: String,
    dependents: BTreeSet<String>,
}

/// Reverse-dependency files in the cache root
#[derive(Debug, Clone)]
pub struct DependencyIndex {
    root: PathBuf,
}

impl DependencyIndex {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn index_path(&self, key: &str) -> PathBuf {
        self.root.join(format!(
            "{}.{DEPS_EXTENSION}",
            key_digest(&format!("deps:{key}"))
        ))
    }

    /// Record that `dependent` depends on `dependency`
    pub fn register(&self, dependency: &str, dependent: &str) -> Result<()> {
        let mut file = self.load_for_update(dependency)?;
        if file.dependents.insert(dependent.to_string()) {
            file.key = dependency.to_string();
            self.store(dependency, &file)?;
        }
        Ok(())
    }

    /// Drop `dependent` from `dependency`'s file, deleting it once empty
    pub fn unregister(&self, dependency: &str, dependent: &str) -> Result<()> {
        let mut file = self.load_for_update(dependency)?;
        if !file.dependents.remove(dependent) {
            return Ok(());
        }

        if file.dependents.is_empty() {
            self.delete(dependency)?;
        } else {
            self.store(dependency, &file)?;
        }
        Ok(())
    }

    /// Keys that depend on `key`
    pub fn dependents(&self, key: &str) -> Result<BTreeSet<String>> {
        Ok(self.load(key)?.dependents)
    }

    /// Read and delete `key`'s file
    pub fn take(&self, key: &str) -> Result<BTreeSet<String>> {
        let dependents = self.dependents(key)?;
        self.delete(key)?;
        Ok(dependents)
    }

    /// Remove every index file
    pub fn clear(&self) -> Result<usize> {
        let dir = fs::read_dir(&self.root)
            .map_err(|e| CacheError::io(&self.root, "list cache directory", e))?;

        let mut removed = 0;
        for item in dir {
            let path = item
                .map_err(|e| CacheError::io(&self.root, "list cache directory", e))?
                .path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(DEPS_EXTENSION)
                && remove_if_exists(&path)
                    .map_err(|e| CacheError::io(&path, "remove dependency index", e))?
            {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn load(&self, key: &str) -> Result<IndexFile> {
        let path = self.index_path(key);
        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(IndexFile::default()),
            Err(e) => return Err(CacheError::io(&path, "read dependency index", e)),
        };

        match serde_json::from_slice::<IndexFile>(&content) {
            Ok(file) if file.key == key => Ok(file),
            Ok(file) => Err(CacheError::corruption(
                key,
                format!("dependency index holds key '{}'", file.key),
            )),
            Err(e) => Err(CacheError::decode(key, e)),
        }
    }

    // An unreadable file is replaced rather than left to fail every update
    fn load_for_update(&self, key: &str) -> Result<IndexFile> {
        match self.load(key) {
            Err(e) if e.is_corruption() => {
                tracing::warn!(key, error = %e, "replacing unreadable dependency index");
                Ok(IndexFile::default())
            }
            other => other,
        }
    }

    fn store(&self, key: &str, file: &IndexFile) -> Result<()> {
        let path = self.index_path(key);
        let content = serde_json::to_vec(file).map_err(|e| CacheError::encode(key, e))?;
        write_atomic(&path, &content).map_err(|e| CacheError::io(&path, "write dependency index", e))
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.index_path(key);
        remove_if_exists(&path)
            .map(|_| ())
            .map_err(|e| CacheError::io(&path, "remove dependency index", e))
    }
}
