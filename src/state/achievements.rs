//! Badge thresholds and the pure evaluation re-run after every score change.

use std::collections::HashSet;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::catalog::GameType;

/// Score needed for the first badge.
pub const FIRST_WIN_SCORE: u32 = 10;

/// Badge a player can unlock once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Achievement {
    /// Reached the first-win score.
    #[serde(rename = "first_win")]
    FirstWin,
    /// Five correct answers in a row.
    #[serde(rename = "streak_5")]
    Streak5,
    /// Ten correct answers in a row.
    #[serde(rename = "streak_10")]
    Streak10,
    /// Fifty points in total.
    #[serde(rename = "score_50")]
    Score50,
    /// One hundred points in total.
    #[serde(rename = "score_100")]
    Score100,
    /// Answered correctly in every built-in game.
    #[serde(rename = "completionist")]
    Completionist,
}

/// Inputs the evaluation looks at.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    /// Total score after the mutation.
    pub total_score: u32,
    /// Streak after the mutation.
    pub streak: u32,
    /// Games with at least one correct answer.
    pub games_completed: &'a HashSet<GameType>,
}

impl Achievement {
    /// Every badge in unlock-check order.
    pub const ALL: [Achievement; 6] = [
        Achievement::FirstWin,
        Achievement::Streak5,
        Achievement::Streak10,
        Achievement::Score50,
        Achievement::Score100,
        Achievement::Completionist,
    ];

    /// Stable identifier, identical to the serde representation.
    pub fn id(self) -> &'static str {
        match self {
            Achievement::FirstWin => "first_win",
            Achievement::Streak5 => "streak_5",
            Achievement::Streak10 => "streak_10",
            Achievement::Score50 => "score_50",
            Achievement::Score100 => "score_100",
            Achievement::Completionist => "completionist",
        }
    }

    /// Title shown in the celebration banner.
    pub fn title(self) -> &'static str {
        match self {
            Achievement::FirstWin => "First win",
            Achievement::Streak5 => "On fire: 5 in a row",
            Achievement::Streak10 => "Unstoppable: 10 in a row",
            Achievement::Score50 => "50 points",
            Achievement::Score100 => "100 points",
            Achievement::Completionist => "Tried every game",
        }
    }

    fn is_met(self, progress: &Progress<'_>) -> bool {
        match self {
            Achievement::FirstWin => progress.total_score >= FIRST_WIN_SCORE,
            Achievement::Streak5 => progress.streak >= 5,
            Achievement::Streak10 => progress.streak >= 10,
            Achievement::Score50 => progress.total_score >= 50,
            Achievement::Score100 => progress.total_score >= 100,
            Achievement::Completionist => GameType::ALL
                .iter()
                .all(|game| progress.games_completed.contains(game)),
        }
    }
}

/// Return the badges whose threshold is met but that are not unlocked yet.
pub fn evaluate(progress: &Progress<'_>, unlocked: &IndexSet<Achievement>) -> Vec<Achievement> {
    Achievement::ALL
        .into_iter()
        .filter(|badge| !unlocked.contains(badge) && badge.is_met(progress))
        .collect()
}
