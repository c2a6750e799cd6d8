//! Round-robin load balancing strategy.

use std::sync::Arc;

use crate::load_balancer::{
    alive_candidates, backend::Backend, cursor::RotationCursor, SelectionContext, Strategy,
    StrategyKind,
};

/// Round-robin selector.
///
/// The cursor is reduced modulo the alive set at call time, so a change in
/// liveness between calls shifts the sequence rather than completing a strict
/// round trip.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: RotationCursor,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for RoundRobin {
    fn select(&self, backends: &[Arc<Backend>], _ctx: &SelectionContext) -> Option<Arc<Backend>> {
        let alive = alive_candidates(backends);
        let index = self.cursor.pick(alive.len())?;
        Some(alive[index].clone())
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::RoundRobin
    }
}
