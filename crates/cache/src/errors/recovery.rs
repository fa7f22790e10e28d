//! Recovery hints for cache errors

use super::types::{CacheError, SerializationOp};
use std::path::PathBuf;
use std::time::Duration;

/// How the engine (or a caller) should recover from an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryHint {
    /// Retry the operation
    Retry { after: Duration },

    /// Drop the offending entry and treat it as a miss
    ClearAndRetry,

    /// Check file permissions
    CheckPermissions { path: PathBuf },

    /// Use a default value
    UseDefault,

    /// Continue with reduced guarantees
    Ignore,

    /// No automated recovery possible
    Manual { instructions: String },
}

impl CacheError {
    /// Get the recovery hint for this error
    #[must_use]
    pub fn recovery_hint(&self) -> RecoveryHint {
        match self {
            Self::Io { path, source, .. } => match source.kind() {
                std::io::ErrorKind::PermissionDenied => {
                    RecoveryHint::CheckPermissions { path: path.clone() }
                }
                _ => RecoveryHint::Retry {
                    after: Duration::from_millis(100),
                },
            },
            Self::Serialization {
                operation: SerializationOp::Decode,
                ..
            }
            | Self::Corruption { .. } => RecoveryHint::ClearAndRetry,
            Self::Serialization {
                operation: SerializationOp::Encode,
                ..
            } => RecoveryHint::Manual {
                instructions: "make the value serializable with the configured codec".to_string(),
            },
            Self::Configuration { .. } => RecoveryHint::UseDefault,
            Self::LockTimeout { .. } => RecoveryHint::Ignore,
            Self::InvalidKey { .. } => RecoveryHint::Manual {
                instructions: "use a non-empty key".to_string(),
            },
        }
    }

    /// Check if this error is transient and can be retried
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self.recovery_hint(),
            RecoveryHint::Retry { .. } | RecoveryHint::Ignore
        )
    }

    /// Check if this error indicates an unreadable blob
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(self.recovery_hint(), RecoveryHint::ClearAndRetry)
    }
}
