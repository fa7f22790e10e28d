//! Error handling for the cache engine
//!
//! Most infrastructure failures never leave the engine: they are logged,
//! counted and degraded around. The types here surface only where a caller can
//! act on them, and internally to decide how a failure is recovered.

mod recovery;
mod types;

pub use recovery::RecoveryHint;
pub use types::*;
