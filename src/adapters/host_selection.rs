//! Uniform random host selection.
//!
//! Seeded from config for reproducible runs; otherwise seeded from OS entropy.

use crate::domain::MemberId;
use crate::ports::HostSelector;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::{Mutex, PoisonError};

pub struct RandomHostSelector {
    rng: Mutex<StdRng>,
}

impl RandomHostSelector {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sequence of picks for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl HostSelector for RandomHostSelector {
    fn select(&self, candidates: &[MemberId]) -> Option<MemberId> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        candidates.choose(&mut *rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn candidates() -> Vec<MemberId> {
        (1..=5).map(MemberId).collect()
    }

    #[test]
    fn same_seed_same_picks() {
        let a = RandomHostSelector::seeded(42);
        let b = RandomHostSelector::seeded(42);
        let c = candidates();
        for _ in 0..20 {
            assert_eq!(a.select(&c), b.select(&c));
        }
    }

    #[test]
    fn picks_cover_every_candidate() {
        let selector = RandomHostSelector::seeded(7);
        let c = candidates();
        let seen: HashSet<MemberId> = (0..500).filter_map(|_| selector.select(&c)).collect();
        assert_eq!(seen.len(), c.len());
    }

    #[test]
    fn empty_candidates_yield_none() {
        assert_eq!(RandomHostSelector::from_entropy().select(&[]), None);
    }
}
