use std::{collections::VecDeque, sync::Arc};

use rand::{Rng, seq::IndexedRandom};

use super::{ChallengeFilter, ChallengeItem};

/// Number of recently served challenges excluded from the next pick.
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

/// Uniform random selection over a fixed library, skipping the last `window`
/// served identifiers.
///
/// When the exclusion would leave nothing to pick (library no larger than the
/// window), the whole filtered pool is used instead.
#[derive(Debug, Clone)]
pub struct ChallengeManager<C> {
    library: Arc<[C]>,
    history: VecDeque<String>,
    window: usize,
}

impl<C: ChallengeItem> ChallengeManager<C> {
    /// Build a manager over `library` with the given history capacity.
    pub fn new(library: impl Into<Arc<[C]>>, window: usize) -> Self {
        Self {
            library: library.into(),
            history: VecDeque::with_capacity(window),
            window,
        }
    }

    /// Number of challenges in the library.
    pub fn len(&self) -> usize {
        self.library.len()
    }

    /// Whether the library is empty.
    pub fn is_empty(&self) -> bool {
        self.library.is_empty()
    }

    /// Recently served identifiers, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    /// Select the next challenge using the thread-local generator.
    pub fn load_next(&mut self, filter: &ChallengeFilter) -> Option<&C> {
        self.load_next_with(filter, &mut rand::rng())
    }

    /// Select the next challenge with a caller-provided generator.
    ///
    /// Returns `None` only when the filter leaves no challenge at all.
    pub fn load_next_with<R: Rng + ?Sized>(
        &mut self,
        filter: &ChallengeFilter,
        rng: &mut R,
    ) -> Option<&C> {
        let pool: Vec<usize> = (0..self.library.len())
            .filter(|&index| filter.matches(&self.library[index]))
            .collect();

        let fresh: Vec<usize> = pool
            .iter()
            .copied()
            .filter(|&index| {
                let id = self.library[index].id();
                !self.history.iter().any(|seen| seen == id)
            })
            .collect();

        let candidates = if fresh.is_empty() { &pool } else { &fresh };
        let index = *candidates.choose(rng)?;

        self.remember(index);
        Some(&self.library[index])
    }

    fn remember(&mut self, index: usize) {
        if self.window == 0 {
            return;
        }
        while self.history.len() >= self.window {
            self.history.pop_front();
        }
        self.history.push_back(self.library[index].id().to_string());
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::challenges::Difficulty;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: String,
        category: Option<String>,
        difficulty: Option<Difficulty>,
    }

    impl ChallengeItem for Item {
        fn id(&self) -> &str {
            &self.id
        }

        fn category(&self) -> Option<&str> {
            self.category.as_deref()
        }

        fn difficulty(&self) -> Option<Difficulty> {
            self.difficulty
        }
    }

    fn items(count: usize) -> Vec<Item> {
        (0..count)
            .map(|i| Item {
                id: format!("c{i}"),
                category: None,
                difficulty: None,
            })
            .collect()
    }

    #[test]
    fn never_repeats_within_window() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut manager = ChallengeManager::new(items(7), 5);
            let mut served: Vec<String> = Vec::new();

            for _ in 0..10 {
                let id = manager
                    .load_next_with(&ChallengeFilter::default(), &mut rng)
                    .unwrap()
                    .id
                    .clone();
                let recent = &served[served.len().saturating_sub(5)..];
                assert!(!recent.contains(&id), "seed {seed}: {id} repeated within {recent:?}");
                served.push(id);
            }
        }
    }

    #[test]
    fn history_ring_evicts_oldest() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut manager = ChallengeManager::new(items(10), 3);
        let mut served = Vec::new();
        for _ in 0..5 {
            served.push(
                manager
                    .load_next_with(&ChallengeFilter::default(), &mut rng)
                    .unwrap()
                    .id
                    .clone(),
            );
        }
        let history: Vec<&str> = manager.history().collect();
        let expected: Vec<&str> = served[2..].iter().map(String::as_str).collect();
        assert_eq!(history, expected);
    }

    #[test]
    fn small_library_falls_back_to_full_pool() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut manager = ChallengeManager::new(items(3), 5);
        for _ in 0..10 {
            assert!(
                manager
                    .load_next_with(&ChallengeFilter::default(), &mut rng)
                    .is_some()
            );
        }
    }

    #[test]
    fn single_item_library_always_returns_it() {
        let mut manager = ChallengeManager::new(items(1), 5);
        for _ in 0..3 {
            assert_eq!(manager.load_next(&ChallengeFilter::default()).unwrap().id, "c0");
        }
    }

    #[test]
    fn filters_restrict_the_pool() {
        let library = vec![
            Item {
                id: "bird-1".into(),
                category: Some("birds".into()),
                difficulty: Some(Difficulty::Easy),
            },
            Item {
                id: "bird-2".into(),
                category: Some("birds".into()),
                difficulty: Some(Difficulty::Hard),
            },
            Item {
                id: "fish-1".into(),
                category: Some("fish".into()),
                difficulty: Some(Difficulty::Easy),
            },
        ];
        let mut manager = ChallengeManager::new(library, 5);
        let filter = ChallengeFilter {
            category: Some("birds".into()),
            max_difficulty: Some(Difficulty::Medium),
        };
        for _ in 0..5 {
            assert_eq!(manager.load_next(&filter).unwrap().id, "bird-1");
        }

        assert!(
            manager
                .load_next(&ChallengeFilter::category("reptiles"))
                .is_none()
        );
    }

    #[test]
    fn empty_library_yields_nothing() {
        let mut manager: ChallengeManager<Item> = ChallengeManager::new(Vec::new(), 5);
        assert!(manager.is_empty());
        assert!(manager.load_next(&ChallengeFilter::default()).is_none());
    }
}
