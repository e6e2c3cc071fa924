//! Score, streak and achievement bookkeeping for one player session.

use std::collections::HashSet;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::state::{
    achievements::{self, Achievement, Progress},
    catalog::GameType,
};

/// Per-game scoring parameters.
///
/// Reward scales with the streak *before* the answer is recorded, so the first
/// correct answer of a run earns exactly `base_points`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoring {
    /// Points for a correct answer with no running streak.
    pub base_points: u32,
    /// Extra points per answer already in the streak.
    pub streak_multiplier: u32,
}

impl Default for Scoring {
    fn default() -> Self {
        Self {
            base_points: 10,
            streak_multiplier: 5,
        }
    }
}

impl Scoring {
    /// Points awarded for a correct answer given the streak before it.
    pub fn points_for(&self, streak_before: u32) -> u32 {
        self.base_points
            .saturating_add(streak_before.saturating_mul(self.streak_multiplier))
    }
}

/// Result of one call to [`GameSessionState::record_outcome`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeReport {
    /// Whether the answer was correct.
    pub correct: bool,
    /// Points added to the total (zero for incorrect answers).
    pub points: u32,
    /// Total score after the outcome.
    pub total_score: u32,
    /// Streak after the outcome.
    pub streak: u32,
    /// Best streak of the session after the outcome.
    pub max_streak: u32,
    /// Badges unlocked by this outcome, in unlock order.
    pub unlocked: Vec<Achievement>,
}

/// Mutable score state owned by the player console.
///
/// Survives navigation back to the menu; discarded only when the player
/// identity is cleared.
#[derive(Debug, Clone, Default)]
pub struct GameSessionState {
    total_score: u32,
    streak: u32,
    max_streak: u32,
    tasks_completed: u32,
    achievements: IndexSet<Achievement>,
    games_completed: HashSet<GameType>,
}

impl GameSessionState {
    /// Fresh all-zero state created at player setup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total score, never decreasing within a session.
    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    /// Consecutive correct answers since the last incorrect one.
    pub fn streak(&self) -> u32 {
        self.streak
    }

    /// Highest streak reached in this session.
    pub fn max_streak(&self) -> u32 {
        self.max_streak
    }

    /// Number of correct answers in this session.
    pub fn tasks_completed(&self) -> u32 {
        self.tasks_completed
    }

    /// Unlocked badges in unlock order.
    pub fn achievements(&self) -> &IndexSet<Achievement> {
        &self.achievements
    }

    /// Games where the player has answered correctly at least once.
    pub fn games_completed(&self) -> &HashSet<GameType> {
        &self.games_completed
    }

    /// Single mutation entry point for every mini-game.
    ///
    /// A correct answer adds `points_if_correct`, extends the streak and runs
    /// the achievement evaluation. An incorrect answer only resets the streak.
    pub fn record_outcome(
        &mut self,
        correct: bool,
        points_if_correct: u32,
        game: Option<GameType>,
    ) -> OutcomeReport {
        if !correct {
            self.streak = 0;
            return self.report(false, 0, Vec::new());
        }

        self.total_score = self.total_score.saturating_add(points_if_correct);
        self.streak += 1;
        self.max_streak = self.max_streak.max(self.streak);
        self.tasks_completed += 1;
        if let Some(game) = game {
            self.games_completed.insert(game);
        }

        let unlocked = achievements::evaluate(
            &Progress {
                total_score: self.total_score,
                streak: self.streak,
                games_completed: &self.games_completed,
            },
            &self.achievements,
        );
        self.achievements.extend(unlocked.iter().copied());

        self.report(true, points_if_correct, unlocked)
    }

    fn report(&self, correct: bool, points: u32, unlocked: Vec<Achievement>) -> OutcomeReport {
        OutcomeReport {
            correct,
            points,
            total_score: self.total_score,
            streak: self.streak,
            max_streak: self.max_streak,
            unlocked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(state: &mut GameSessionState, scoring: Scoring, correct: bool) -> OutcomeReport {
        let points = scoring.points_for(state.streak());
        state.record_outcome(correct, points, Some(GameType::Binary))
    }

    #[test]
    fn scoring_uses_streak_before_answer() {
        let scoring = Scoring {
            base_points: 10,
            streak_multiplier: 5,
        };
        let mut state = GameSessionState::new();
        let awarded: Vec<u32> = (0..3)
            .map(|_| answer(&mut state, scoring, true).points)
            .collect();
        assert_eq!(awarded, vec![10, 15, 20]);
        assert_eq!(state.total_score(), 45);
    }

    #[test]
    fn total_is_sum_of_points_and_max_streak_is_peak() {
        let scoring = Scoring::default();
        let mut state = GameSessionState::new();
        let mut expected_total = 0;
        let mut peak = 0;
        for correct in [true, true, false, true, true, true, false, true] {
            let report = answer(&mut state, scoring, correct);
            expected_total += report.points;
            peak = peak.max(report.streak);
            assert!(state.max_streak() >= state.streak());
        }
        assert_eq!(state.total_score(), expected_total);
        assert_eq!(state.max_streak(), peak);
        assert_eq!(peak, 3);
    }

    #[test]
    fn incorrect_answer_only_resets_streak() {
        let mut state = GameSessionState::new();
        state.record_outcome(true, 10, Some(GameType::Binary));
        state.record_outcome(true, 15, Some(GameType::Binary));

        let report = state.record_outcome(false, 100, Some(GameType::Binary));
        assert_eq!(report.points, 0);
        assert_eq!(state.streak(), 0);
        assert_eq!(state.total_score(), 25);
        assert_eq!(state.max_streak(), 2);
        assert_eq!(state.tasks_completed(), 2);
        assert!(report.unlocked.is_empty());
    }

    #[test]
    fn first_win_unlocks_exactly_once() {
        let mut state = GameSessionState::new();
        let first = state.record_outcome(true, 10, Some(GameType::Sorting));
        assert_eq!(first.unlocked, vec![Achievement::FirstWin]);

        state.record_outcome(false, 0, Some(GameType::Sorting));
        let later = state.record_outcome(true, 50, Some(GameType::Sorting));
        assert_eq!(later.unlocked, vec![Achievement::Score50]);

        let count = state
            .achievements()
            .iter()
            .filter(|badge| **badge == Achievement::FirstWin)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn custom_tests_do_not_count_towards_completion() {
        let mut state = GameSessionState::new();
        state.record_outcome(true, 10, None);
        assert!(state.games_completed().is_empty());
        assert_eq!(state.tasks_completed(), 1);
    }
}
