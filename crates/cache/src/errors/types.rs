//! Core error types for the cache engine

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Re-export CacheError as Error for convenience
pub use CacheError as Error;

/// Error type for cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// I/O errors during cache operations
    #[error("I/O error during {operation} on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Value or blob serialization errors
    #[error("failed to {operation} value for key '{key}': {source}")]
    Serialization {
        key: String,
        operation: SerializationOp,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A blob on disk failed validation
    #[error("cache corruption detected for key '{key}': {reason}")]
    Corruption { key: String, reason: String },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Distributed lock could not be acquired in time
    #[error("timed out after {waited:?} waiting for lock '{name}'")]
    LockTimeout { name: String, waited: Duration },

    /// Invalid cache key
    #[error("invalid cache key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },
}

/// Serialization operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationOp {
    Encode,
    Decode,
}

impl fmt::Display for SerializationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode => f.write_str("encode"),
            Self::Decode => f.write_str("decode"),
        }
    }
}

impl CacheError {
    pub(crate) fn io(path: &Path, operation: &'static str, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            operation,
            source,
        }
    }

    pub(crate) fn encode(
        key: &str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Serialization {
            key: key.to_string(),
            operation: SerializationOp::Encode,
            source: source.into(),
        }
    }

    pub(crate) fn decode(
        key: &str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Serialization {
            key: key.to_string(),
            operation: SerializationOp::Decode,
            source: source.into(),
        }
    }

    pub(crate) fn corruption(key: &str, reason: impl Into<String>) -> Self {
        Self::Corruption {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
