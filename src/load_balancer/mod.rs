//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Request arrives
//!     → SelectionContext (affinity key = client IP)
//!     → active Strategy::select over pool.rs backends:
//!         - round_robin.rs (rotate through alive backends)
//!         - least_conn.rs (fewest in-flight connections)
//!         - random.rs (uniform over alive backends)
//!         - weighted.rs (round robin over weight-expanded alive set)
//!         - ip_hash.rs (hash of affinity key over alive backends)
//!     → backend.rs (connection guard + forward)
//! ```
//!
//! # Design Decisions
//! - Strategies only read backend state; they never mutate liveness
//! - Unhealthy backends excluded from selection
//! - `None` means "no backend available", not an error

pub mod backend;
pub mod cursor;
pub mod error;
pub mod ip_hash;
pub mod kind;
pub mod least_conn;
pub mod pool;
pub mod random;
pub mod round_robin;
pub mod weighted;

use std::fmt::Debug;
use std::net::SocketAddr;
use std::sync::Arc;

pub use backend::{Backend, BackendConnectionGuard};
pub use error::{ForwardError, LoadBalancerError, LoadBalancerResult};
pub use kind::StrategyKind;
pub use pool::BackendPool;

/// Per-request input to selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionContext {
    affinity_key: Option<String>,
}

impl SelectionContext {
    /// Context without an affinity key.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_affinity_key(key: impl Into<String>) -> Self {
        Self {
            affinity_key: Some(key.into()),
        }
    }

    /// Context keyed on the client's IP (the port is ignored).
    pub fn from_client(addr: SocketAddr) -> Self {
        Self::with_affinity_key(addr.ip().to_string())
    }

    pub fn affinity_key(&self) -> Option<&str> {
        self.affinity_key.as_deref()
    }
}

/// A backend selection algorithm.
pub trait Strategy: Send + Sync + Debug {
    /// Pick one alive backend, or `None` when the input is empty or nothing is alive.
    fn select(&self, backends: &[Arc<Backend>], ctx: &SelectionContext) -> Option<Arc<Backend>>;

    fn kind(&self) -> StrategyKind;

    fn name(&self) -> &'static str {
        self.kind().display_name()
    }
}

/// Alive backends in registration order.
pub(crate) fn alive_candidates(backends: &[Arc<Backend>]) -> Vec<&Arc<Backend>> {
    backends.iter().filter(|b| b.is_alive()).collect()
}

#[cfg(test)]
pub(crate) fn test_backends(count: usize) -> Vec<Arc<Backend>> {
    (0..count)
        .map(|i| Arc::new(Backend::new(&format!("http://localhost:{}", 8081 + i), 1).unwrap()))
        .collect()
}
