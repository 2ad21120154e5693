use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use crate::game::{MoveSelector, candidate_pool, now_millis};
use crate::types::{GeneratedMoves, Move};

/// Uniform choice over the candidate pool. No look-ahead.
#[derive(Debug, Clone)]
pub struct RandomMoveSelector {
    rng: StdRng,
}

impl RandomMoveSelector {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeds from the wall clock.
    pub fn from_clock() -> Self {
        Self::new(now_millis())
    }
}

impl MoveSelector for RandomMoveSelector {
    fn select_move(&mut self, generated: &GeneratedMoves) -> Option<Move> {
        candidate_pool(generated).choose(&mut self.rng).cloned()
    }
}
