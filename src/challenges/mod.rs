//! Static challenge content and the "don't repeat recent challenges" selector.

mod library;
mod manager;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::catalog::GameType;

pub use self::library::ChallengeLibrary;
pub use self::manager::{ChallengeManager, DEFAULT_HISTORY_WINDOW};

/// Difficulty tier of a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Warm-up questions.
    Easy,
    /// Regular questions.
    Medium,
    /// Stretch questions.
    Hard,
}

/// One unit of gameplay content. Never mutated, only selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Challenge {
    /// Identifier unique within the library.
    pub id: String,
    /// Game the challenge belongs to.
    pub game_type: GameType,
    /// Sub-filter for category-partitioned games.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Question shown to the player.
    pub prompt: String,
    /// Accepted answers; the first one is canonical.
    pub answers: Vec<String>,
    /// Shown after the player answers.
    pub explanation: String,
    /// Optional difficulty tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

/// Anything the [`ChallengeManager`] can select from.
pub trait ChallengeItem {
    /// Identifier recorded in the history ring.
    fn id(&self) -> &str;

    /// Category used by [`ChallengeFilter::category`].
    fn category(&self) -> Option<&str> {
        None
    }

    /// Tier used by [`ChallengeFilter::max_difficulty`].
    fn difficulty(&self) -> Option<Difficulty> {
        None
    }
}

impl ChallengeItem for Challenge {
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

/// Restricts the pool before the history exclusion is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChallengeFilter {
    /// Keep only challenges of this category.
    pub category: Option<String>,
    /// Keep only challenges at or below this tier; untiered challenges always pass.
    pub max_difficulty: Option<Difficulty>,
}

impl ChallengeFilter {
    /// Filter on a single category.
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            max_difficulty: None,
        }
    }

    /// Whether `item` belongs to the filtered pool.
    pub fn matches<C: ChallengeItem>(&self, item: &C) -> bool {
        let category_ok = match &self.category {
            Some(wanted) => item.category() == Some(wanted.as_str()),
            None => true,
        };
        let difficulty_ok = match (self.max_difficulty, item.difficulty()) {
            (Some(max), Some(tier)) => tier <= max,
            _ => true,
        };
        category_ok && difficulty_ok
    }
}
