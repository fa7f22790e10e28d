//! Eviction policies for the memory tier
//!
//! Each memory partition owns one policy instance, so policies are plain
//! single-owner state mutated under the partition lock.

mod factory;
mod policies;
mod traits;

pub use factory::create_eviction_policy;
pub use policies::{FifoPolicy, LfuPolicy, LruPolicy};
pub use traits::EvictionPolicy;
