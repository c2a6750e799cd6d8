//! Backend registry.
//!
//! # Responsibilities
//! - Own the ordered collection of backends (one per configured address)
//! - Provide liveness-filtered views for selection
//! - Resolve backends by address for administrative liveness overrides
//!
//! The list is only appended to while the pool is being built (`&mut self`);
//! once shared behind an `Arc` only per-backend fields change.

use std::sync::Arc;

use crate::config::BackendConfig;
use crate::load_balancer::{
    backend::Backend,
    cursor::RotationCursor,
    error::{LoadBalancerError, LoadBalancerResult},
};

/// Ordered registry of backends.
#[derive(Debug, Default)]
pub struct BackendPool {
    backends: Vec<Arc<Backend>>,
    cursor: RotationCursor,
}

impl BackendPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pool from configuration. Fails on an empty list, an
    /// unparseable address or a duplicate address.
    pub fn from_config(configs: &[BackendConfig]) -> LoadBalancerResult<Self> {
        if configs.is_empty() {
            return Err(LoadBalancerError::NoBackends);
        }

        let mut pool = Self::new();
        for config in configs {
            let backend = Backend::new(&config.url, config.weight)?;
            pool.add(backend)?;
        }
        Ok(pool)
    }

    /// Append a backend. Rejects an address that is already registered.
    pub fn add(&mut self, backend: Backend) -> LoadBalancerResult<Arc<Backend>> {
        if self.backends.iter().any(|b| b.matches(backend.url())) {
            return Err(LoadBalancerError::DuplicateBackend(
                backend.address().to_string(),
            ));
        }
        let backend = Arc::new(backend);
        self.backends.push(backend.clone());
        Ok(backend)
    }

    /// All backends in registration order.
    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    /// Backends alive at the time of the call, in registration order.
    pub fn alive_backends(&self) -> Vec<Arc<Backend>> {
        self.backends
            .iter()
            .filter(|b| b.is_alive())
            .cloned()
            .collect()
    }

    pub fn alive_count(&self) -> usize {
        self.backends.iter().filter(|b| b.is_alive()).count()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Advance the pool cursor and reduce it modulo the total backend count.
    pub fn next_index(&self) -> usize {
        self.cursor.pick(self.backends.len()).unwrap_or(0)
    }

    /// First alive backend at or after the next cursor position.
    pub fn next_peer(&self) -> Option<Arc<Backend>> {
        if self.backends.is_empty() {
            return None;
        }
        let start = self.next_index();
        let len = self.backends.len();
        (0..len)
            .map(|i| &self.backends[(start + i) % len])
            .find(|b| b.is_alive())
            .cloned()
    }

    /// Look up a backend by address. The address is normalised the same way
    /// configured addresses are.
    pub fn backend_by_address(&self, address: &str) -> Option<Arc<Backend>> {
        let url = Backend::parse_address(address).ok()?;
        self.backends.iter().find(|b| b.matches(&url)).cloned()
    }

    /// Override the liveness of the backend registered under `address`.
    pub fn mark_backend_status(&self, address: &str, alive: bool) -> LoadBalancerResult<Arc<Backend>> {
        let backend = self
            .backend_by_address(address)
            .ok_or_else(|| LoadBalancerError::BackendNotFound(address.to_string()))?;
        let was_alive = backend.set_alive(alive);
        if was_alive != alive {
            tracing::info!(backend = %backend.address(), alive, "Backend liveness overridden");
        }
        Ok(backend)
    }
}
