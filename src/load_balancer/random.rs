//! Random load balancing strategy.

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::load_balancer::{
    alive_candidates, backend::Backend, SelectionContext, Strategy, StrategyKind,
};

/// Uniform random selector over the alive set.
///
/// The generator is seeded once, at construction.
#[derive(Debug)]
pub struct Random {
    rng: Mutex<StdRng>,
}

impl Random {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic generator, for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for Random {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for Random {
    fn select(&self, backends: &[Arc<Backend>], _ctx: &SelectionContext) -> Option<Arc<Backend>> {
        let alive = alive_candidates(backends);
        if alive.is_empty() {
            return None;
        }

        // A poisoned lock still holds a usable generator.
        let index = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            rng.gen_range(0..alive.len())
        };
        Some(alive[index].clone())
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Random
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::test_backends;
    use std::collections::HashSet;

    #[test]
    fn test_random_covers_all_backends() {
        let lb = Random::new();
        let backends = test_backends(3);
        let ctx = SelectionContext::new();

        let selected: HashSet<String> = (0..100)
            .map(|_| lb.select(&backends, &ctx).unwrap().address().to_string())
            .collect();
        assert_eq!(selected.len(), 3);
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let backends = test_backends(5);
        let ctx = SelectionContext::new();
        let a = Random::with_seed(7);
        let b = Random::with_seed(7);

        for _ in 0..20 {
            assert_eq!(
                a.select(&backends, &ctx).unwrap().address(),
                b.select(&backends, &ctx).unwrap().address()
            );
        }
    }

    #[test]
    fn test_only_alive_selected() {
        let lb = Random::with_seed(1);
        let backends = test_backends(3);
        backends[0].set_alive(false);
        backends[2].set_alive(false);

        for _ in 0..20 {
            let chosen = lb.select(&backends, &SelectionContext::new()).unwrap();
            assert_eq!(chosen.address(), backends[1].address());
        }

        backends[1].set_alive(false);
        assert!(lb.select(&backends, &SelectionContext::new()).is_none());
        assert!(lb.select(&[], &SelectionContext::new()).is_none());
    }
}
