//! Blob envelope for entries on disk
//!
//! ```text
//! +----------------+-----------------------------------------------+
//! | BlobHeader     | payload: bincode(CacheEntry), maybe zstd'd    |
//! +----------------+-----------------------------------------------+
//! ```
//!
//! The header is bincode-encoded with fixed-width integers so its size is
//! constant. Any mismatch (magic, version, length, CRC) is reported as
//! corruption, which readers treat as a miss.

use crate::entry::CacheEntry;
use crate::errors::{CacheError, Result};
use crc32c::crc32c;
use serde::{Deserialize, Serialize};

/// Magic number for blob files: "TCHE"
pub const BLOB_MAGIC: u32 = 0x5443_4845;

/// Current blob format version
pub const FORMAT_VERSION: u16 = 1;

/// Default zstd compression level (3 = fast with good compression)
pub const COMPRESSION_LEVEL: i32 = 3;

/// Fixed-size header in front of every blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobHeader {
    magic: u32,
    version: u16,
    /// Bit 0: payload is zstd-compressed
    flags: u16,
    payload_len: u64,
    payload_crc: u32,
}

impl BlobHeader {
    const FLAG_COMPRESSED: u16 = 1 << 0;

    fn new(payload: &[u8], compressed: bool) -> Self {
        Self {
            magic: BLOB_MAGIC,
            version: FORMAT_VERSION,
            flags: if compressed { Self::FLAG_COMPRESSED } else { 0 },
            payload_len: payload.len() as u64,
            payload_crc: crc32c(payload),
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.flags & Self::FLAG_COMPRESSED != 0
    }

    fn validate(&self, key: &str) -> Result<()> {
        if self.magic != BLOB_MAGIC {
            return Err(CacheError::corruption(
                key,
                format!(
                    "invalid magic number: expected {BLOB_MAGIC:08x}, got {:08x}",
                    self.magic
                ),
            ));
        }

        if self.version > FORMAT_VERSION {
            return Err(CacheError::corruption(
                key,
                format!("unsupported blob version: {}", self.version),
            ));
        }

        Ok(())
    }
}

/// Serialized size of [`BlobHeader`]
pub fn header_len() -> usize {
    // magic + version + flags + payload_len + payload_crc
    4 + 2 + 2 + 8 + 4
}

/// Encode an entry into a blob, compressing payloads above `compression_threshold`
pub fn encode_entry(entry: &CacheEntry, compression_threshold: usize) -> Result<Vec<u8>> {
    let raw = bincode::serialize(entry).map_err(|e| CacheError::encode(&entry.key, e))?;

    let (payload, compressed) = if raw.len() > compression_threshold {
        match zstd::bulk::compress(&raw, COMPRESSION_LEVEL) {
            Ok(packed) if packed.len() < raw.len() => (packed, true),
            Ok(_) => (raw, false),
            Err(e) => {
                tracing::debug!(key = %entry.key, error = %e, "compression failed, storing raw");
                (raw, false)
            }
        }
    } else {
        (raw, false)
    };

    let header = BlobHeader::new(&payload, compressed);
    let mut blob = bincode::serialize(&header).map_err(|e| CacheError::encode(&entry.key, e))?;
    blob.extend_from_slice(&payload);
    Ok(blob)
}

/// Decode and verify a blob
///
/// `label` names the blob in errors (the key when known, else the path).
pub fn decode_entry(blob: &[u8], label: &str) -> Result<CacheEntry> {
    if blob.len() < header_len() {
        return Err(CacheError::corruption(
            label,
            format!("blob too short: {} bytes", blob.len()),
        ));
    }

    let header: BlobHeader =
        bincode::deserialize(&blob[..header_len()]).map_err(|e| CacheError::decode(label, e))?;
    header.validate(label)?;

    let payload = &blob[header_len()..];
    if payload.len() as u64 != header.payload_len {
        return Err(CacheError::corruption(
            label,
            format!(
                "payload length mismatch: expected {}, got {}",
                header.payload_len,
                payload.len()
            ),
        ));
    }

    let actual_crc = crc32c(payload);
    if actual_crc != header.payload_crc {
        return Err(CacheError::corruption(
            label,
            format!(
                "payload CRC mismatch: expected {:08x}, got {actual_crc:08x}",
                header.payload_crc
            ),
        ));
    }

    if header.is_compressed() {
        let raw = zstd::stream::decode_all(payload).map_err(|e| CacheError::decode(label, e))?;
        bincode::deserialize(&raw).map_err(|e| CacheError::decode(label, e))
    } else {
        bincode::deserialize(payload).map_err(|e| CacheError::decode(label, e))
    }
}
