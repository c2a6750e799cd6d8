//! Least Connections load balancing strategy.

use std::sync::Arc;

use crate::load_balancer::{backend::Backend, SelectionContext, Strategy, StrategyKind};

/// Least connections selector.
/// Selects the alive backend with the minimum number of active connections.
#[derive(Debug, Default)]
pub struct LeastConnections;

impl LeastConnections {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for LeastConnections {
    fn select(&self, backends: &[Arc<Backend>], _ctx: &SelectionContext) -> Option<Arc<Backend>> {
        // In case of tie, the first one is selected (stability)
        backends
            .iter()
            .filter(|b| b.is_alive())
            .min_by_key(|b| b.connections())
            .cloned()
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::LeastConnections
    }
}
