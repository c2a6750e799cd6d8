//! Weighted round-robin load balancing strategy.

use std::sync::Arc;

use crate::load_balancer::{
    backend::Backend, cursor::RotationCursor, SelectionContext, Strategy, StrategyKind,
};

/// Weighted round-robin selector.
///
/// Behaves like round robin over the alive set expanded so that each backend
/// appears `weight` times in a row, in registration order. Weight 0 excludes
/// a backend. The expansion is walked rather than materialised.
#[derive(Debug, Default)]
pub struct WeightedRoundRobin {
    cursor: RotationCursor,
}

impl WeightedRoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for WeightedRoundRobin {
    fn select(&self, backends: &[Arc<Backend>], _ctx: &SelectionContext) -> Option<Arc<Backend>> {
        let weighted: Vec<&Arc<Backend>> = backends
            .iter()
            .filter(|b| b.is_alive() && b.weight() > 0)
            .collect();
        let total: u64 = weighted.iter().map(|b| u64::from(b.weight())).sum();
        if total == 0 {
            return None;
        }

        let slot = self.cursor.advance() % total;
        let mut accumulated = 0u64;
        for backend in &weighted {
            accumulated += u64::from(backend.weight());
            if slot < accumulated {
                return Some((*backend).clone());
            }
        }
        None
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Weighted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weighted(weights: &[u32]) -> Vec<Arc<Backend>> {
        weights
            .iter()
            .enumerate()
            .map(|(i, w)| Arc::new(Backend::new(&format!("127.0.0.1:{}", 9100 + i), *w).unwrap()))
            .collect()
    }

    #[test]
    fn test_expanded_order() {
        let lb = WeightedRoundRobin::new();
        let backends = weighted(&[2, 1]);
        let ctx = SelectionContext::new();

        let order: Vec<String> = (0..6)
            .map(|_| lb.select(&backends, &ctx).unwrap().address().to_string())
            .collect();
        let a = backends[0].address().to_string();
        let b = backends[1].address().to_string();
        assert_eq!(order, vec![a.clone(), a.clone(), b.clone(), a.clone(), a, b]);
    }

    #[test]
    fn test_three_to_one_distribution() {
        let lb = WeightedRoundRobin::new();
        let backends = weighted(&[3, 1]);
        let ctx = SelectionContext::new();

        let mut counts = [0usize; 2];
        for _ in 0..40 {
            let chosen = lb.select(&backends, &ctx).unwrap();
            let idx = backends.iter().position(|b| b.address() == chosen.address()).unwrap();
            counts[idx] += 1;
        }
        assert_eq!(counts, [30, 10]);
    }

    #[test]
    fn test_zero_weight_and_dead_excluded() {
        let lb = WeightedRoundRobin::new();
        let backends = weighted(&[0, 2, 1]);
        backends[2].set_alive(false);
        let ctx = SelectionContext::new();

        for _ in 0..5 {
            assert_eq!(lb.select(&backends, &ctx).unwrap().address(), backends[1].address());
        }

        backends[1].set_alive(false);
        assert!(lb.select(&backends, &ctx).is_none());
        assert!(lb.select(&[], &ctx).is_none());
    }
}
