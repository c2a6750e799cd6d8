//! Client-affinity (IP hash) load balancing strategy.
//!
//! Maps the request's affinity key (the client IP by default) to one alive
//! backend with plain modulo hashing: `hash(key) % alive.len()`. The mapping
//! is stable for a key while the alive set is unchanged; any change to the
//! alive set may remap keys. Requests without a key go to the first alive
//! backend.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::load_balancer::{
    alive_candidates, backend::Backend, SelectionContext, Strategy, StrategyKind,
};

#[derive(Debug, Default)]
pub struct IpHash;

impl IpHash {
    pub fn new() -> Self {
        Self
    }
}

/// Deterministic hash of an affinity key (fixed-key SipHash).
pub fn hash_key(key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

impl Strategy for IpHash {
    fn select(&self, backends: &[Arc<Backend>], ctx: &SelectionContext) -> Option<Arc<Backend>> {
        let alive = alive_candidates(backends);
        if alive.is_empty() {
            return None;
        }

        let index = match ctx.affinity_key() {
            Some(key) => (hash_key(key) % alive.len() as u64) as usize,
            None => 0,
        };
        Some(alive[index].clone())
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::IpHash
    }
}
