//! Disk tier: one blob file per entry in the shared cache root
//!
//! Blob names are `<sha256(key)>.entry`. Writes go through a temp file and a
//! rename, so readers in any process see whole blobs only. Aggregate size is
//! measured from the directory itself, which keeps it correct when several
//! processes write to the same root.

pub mod format;
mod sweep;

pub use sweep::{order_candidates, sweep_target, SweepCandidate};

use crate::entry::CacheEntry;
use crate::errors::{CacheError, Result};
use crate::partition::key_digest;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tiercache_utils::{remove_if_exists, write_atomic};

/// Extension of entry blob files
pub const ENTRY_EXTENSION: &str = "entry";

/// Blob storage rooted at the cache directory
#[derive(Debug, Clone)]
pub struct DiskTier {
    root: PathBuf,
    compression_threshold: usize,
}

impl DiskTier {
    pub fn new(root: &Path, compression_threshold: usize) -> Self {
        Self {
            root: root.to_path_buf(),
            compression_threshold,
        }
    }

    /// Blob file for a key
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{ENTRY_EXTENSION}", key_digest(key)))
    }

    /// Read an entry
    ///
    /// `Ok(None)` when no blob exists. Expiry is not checked here. A blob
    /// whose stored key differs from `key` is reported as corruption.
    pub fn read(&self, key: &str) -> Result<Option<CacheEntry>> {
        let path = self.entry_path(key);
        let blob = match fs::read(&path) {
            Ok(blob) => blob,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(&path, "read blob", e)),
        };

        let entry = format::decode_entry(&blob, key)?;
        if entry.key != key {
            return Err(CacheError::corruption(
                key,
                format!("blob holds key '{}'", entry.key),
            ));
        }
        Ok(Some(entry))
    }

    /// Read a blob by path, whatever key it holds
    pub fn read_path(&self, path: &Path) -> Result<CacheEntry> {
        let blob = fs::read(path).map_err(|e| CacheError::io(path, "read blob", e))?;
        format::decode_entry(&blob, &path.display().to_string())
    }

    /// Write an entry, returning the blob size in bytes
    pub fn write(&self, entry: &CacheEntry) -> Result<u64> {
        let blob = format::encode_entry(entry, self.compression_threshold)?;
        let path = self.entry_path(&entry.key);
        write_atomic(&path, &blob).map_err(|e| CacheError::io(&path, "write blob", e))?;
        Ok(blob.len() as u64)
    }

    /// Remove a key's blob; `Ok(false)` if there was none
    pub fn remove(&self, key: &str) -> Result<bool> {
        self.remove_path(&self.entry_path(key))
    }

    pub fn remove_path(&self, path: &Path) -> Result<bool> {
        remove_if_exists(path).map_err(|e| CacheError::io(path, "remove blob", e))
    }

    /// Entry blobs currently in the root with their metadata
    pub fn entry_files(&self) -> Result<Vec<(PathBuf, fs::Metadata)>> {
        let dir = fs::read_dir(&self.root)
            .map_err(|e| CacheError::io(&self.root, "list cache directory", e))?;

        let mut files = Vec::new();
        for item in dir {
            let item = item.map_err(|e| CacheError::io(&self.root, "list cache directory", e))?;
            let path = item.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            // Blobs can vanish under us when another process removes them
            match item.metadata() {
                Ok(metadata) if metadata.is_file() => files.push((path, metadata)),
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(CacheError::io(&path, "stat blob", e)),
            }
        }
        Ok(files)
    }

    /// Aggregate size of all entry blobs
    pub fn total_size(&self) -> Result<u64> {
        Ok(self
            .entry_files()?
            .iter()
            .map(|(_, metadata)| metadata.len())
            .sum())
    }

    /// Sweep candidates for every blob
    pub fn sweep_candidates(&self) -> Result<Vec<SweepCandidate>> {
        Ok(self
            .entry_files()?
            .into_iter()
            .map(|(path, metadata)| SweepCandidate::from_metadata(path, &metadata))
            .collect())
    }

    /// Remove every entry blob, returning how many were removed
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for (path, _) in self.entry_files()? {
            if self.remove_path(&path)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
