//! Random liveness challenge selection.

use checkpoint_common::constants::CHALLENGE_LENGTH;
use checkpoint_common::{ChallengeSequence, ConfigError, LivenessAction};
use rand::RngCore;
use rand::seq::SliceRandom;

/// Draws `k` distinct actions from a catalog, freshly shuffled per call
#[derive(Debug, Clone)]
pub struct ChallengeSelector {
    catalog: Vec<LivenessAction>,
    length: usize,
}

impl ChallengeSelector {
    /// Fails fast if the catalog cannot supply `length` distinct actions
    pub fn new(catalog: &[LivenessAction], length: usize) -> Result<Self, ConfigError> {
        let distinct = ChallengeSequence::new(catalog.to_vec()).is_some();
        if length == 0 || !distinct || catalog.len() < length {
            return Err(ConfigError::CatalogTooSmall {
                catalog_len: catalog.len(),
                challenge_len: length,
            });
        }

        Ok(Self {
            catalog: catalog.to_vec(),
            length,
        })
    }

    /// The built-in six-action catalog, three actions per attempt
    pub fn standard() -> Self {
        Self {
            catalog: LivenessAction::CATALOG.to_vec(),
            length: CHALLENGE_LENGTH,
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Shuffle without replacement, take the first `length`
    pub fn select(&self, rng: &mut dyn RngCore) -> ChallengeSequence {
        let mut pool = self.catalog.clone();
        pool.shuffle(rng);
        pool.truncate(self.length);

        match ChallengeSequence::new(pool) {
            Some(sequence) => sequence,
            None => unreachable!("catalog is checked for size and duplicates in new()"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkpoint_common::ActionId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn always_three_distinct_actions() {
        let selector = ChallengeSelector::standard();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            let seq = selector.select(&mut rng);
            assert_eq!(seq.len(), 3);
            let ids: HashSet<ActionId> = seq.ids().into_iter().collect();
            assert_eq!(ids.len(), 3);
        }
    }

    #[test]
    fn reselects_on_every_call() {
        let selector = ChallengeSelector::standard();
        let mut rng = StdRng::seed_from_u64(99);
        let draws: HashSet<Vec<ActionId>> = (0..50).map(|_| selector.select(&mut rng).ids()).collect();
        assert!(draws.len() > 1);
    }

    #[test]
    fn same_seed_same_sequence() {
        let selector = ChallengeSelector::standard();
        let a = selector.select(&mut StdRng::seed_from_u64(5));
        let b = selector.select(&mut StdRng::seed_from_u64(5));
        assert_eq!(a, b);
    }

    #[test]
    fn every_action_eventually_drawn() {
        let selector = ChallengeSelector::standard();
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            seen.extend(selector.select(&mut rng).ids());
        }
        assert_eq!(seen.len(), LivenessAction::CATALOG.len());
    }

    #[test]
    fn small_catalog_is_a_config_error() {
        let catalog = &LivenessAction::CATALOG[..2];
        assert_eq!(
            ChallengeSelector::new(catalog, 3).unwrap_err(),
            ConfigError::CatalogTooSmall {
                catalog_len: 2,
                challenge_len: 3
            }
        );
        assert!(ChallengeSelector::new(&[], 3).is_err());
        assert!(ChallengeSelector::new(&LivenessAction::CATALOG, 6).is_ok());
    }
}
