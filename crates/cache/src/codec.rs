//! Pluggable value serialization
//!
//! The engine stores opaque bytes. A [`Codec`] turns caller values into those
//! bytes and back; the cache is generic over it.

use crate::errors::{CacheError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Bytes-in/bytes-out serializer for cached values
pub trait Codec: Send + Sync + 'static {
    fn encode<T>(&self, key: &str, value: &T) -> Result<Vec<u8>>
    where
        T: Serialize + ?Sized;

    fn decode<T>(&self, key: &str, bytes: &[u8]) -> Result<T>
    where
        T: DeserializeOwned;
}

/// JSON payloads, readable by any process regardless of the Rust types used
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T>(&self, key: &str, value: &T) -> Result<Vec<u8>>
    where
        T: Serialize + ?Sized,
    {
        serde_json::to_vec(value).map_err(|e| CacheError::encode(key, e))
    }

    fn decode<T>(&self, key: &str, bytes: &[u8]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice(bytes).map_err(|e| CacheError::decode(key, e))
    }
}

/// Compact binary payloads
///
/// Not self-describing: every reader must decode with the type it was
/// written with.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    fn encode<T>(&self, key: &str, value: &T) -> Result<Vec<u8>>
    where
        T: Serialize + ?Sized,
    {
        bincode::serialize(value).map_err(|e| CacheError::encode(key, e))
    }

    fn decode<T>(&self, key: &str, bytes: &[u8]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        bincode::deserialize(bytes).map_err(|e| CacheError::decode(key, e))
    }
}
