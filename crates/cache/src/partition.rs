//! Key to partition routing and key digests
//!
//! Both functions are pure content hashes so that every process sharing a
//! cache root agrees on partition numbers and file names across restarts.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of a key, used for every on-disk file name
pub fn key_digest(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Maps keys onto a fixed number of partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionRouter {
    partitions: usize,
}

impl PartitionRouter {
    pub fn new(partitions: usize) -> Self {
        Self {
            partitions: partitions.max(1),
        }
    }

    pub fn partition_count(&self) -> usize {
        self.partitions
    }

    /// First eight digest bytes, big-endian, modulo the partition count
    #[inline]
    pub fn partition(&self, key: &str) -> usize {
        let digest = Sha256::digest(key.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        (u64::from_be_bytes(prefix) % self.partitions as u64) as usize
    }
}
