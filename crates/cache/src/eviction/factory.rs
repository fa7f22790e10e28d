//! Factory for creating eviction policies

use super::policies::{FifoPolicy, LfuPolicy, LruPolicy};
use super::traits::EvictionPolicy;
use crate::config::EvictionPolicyKind;

/// Eviction policy factory
pub fn create_eviction_policy(kind: EvictionPolicyKind) -> Box<dyn EvictionPolicy> {
    match kind {
        EvictionPolicyKind::Lru => Box::new(LruPolicy::new()),
        EvictionPolicyKind::Lfu => Box::new(LfuPolicy::new()),
        EvictionPolicyKind::Fifo => Box::new(FifoPolicy::new()),
    }
}
