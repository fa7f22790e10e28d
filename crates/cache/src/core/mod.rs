//! Cache orchestration
//!
//! [`Cache`] ties the tiers together. Every key-level operation takes the
//! key's partition lock first and then, for disk mutations, the key's
//! distributed lock with a bounded wait. Operations that touch several keys
//! (cascades, preloading, sweeps) take those locks one key at a time and
//! never while holding another partition's lock.

// Private modules
mod builder;
mod operations;
mod preload;
mod sweep;
mod types;

pub use builder::CacheBuilder;
pub use sweep::SweepReport;
pub use types::{Cache, EntryOptions};
