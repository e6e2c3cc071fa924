use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    challenges::Challenge,
    dto::{
        live::LiveAssignmentDto, phase::VisiblePhase, player::PlayerSummary,
        validation::validate_not_blank,
    },
    services::message_service::PersonalizedMessage,
    state::{
        achievements::Achievement,
        catalog::{Activity, GameType},
        console::PlayerConsole,
        state_machine::GamePhase,
    },
};

/// Menu choice.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartGameRequest {
    /// Game picked from the menu.
    pub game_type: GameType,
}

/// Category choice for a partitioned game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SelectCategoryRequest {
    /// Category picked for the pending game.
    #[validate(custom(function = "validate_not_blank"), length(max = 64))]
    pub category: String,
}

/// Outcome reported by a mini-game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AnswerRequest {
    /// Whether the player answered correctly.
    pub correct: bool,
    /// Question answered; defaults to the challenge that was served.
    #[serde(default)]
    #[validate(length(max = 500))]
    pub question: Option<String>,
    /// Game-specific fields copied into the result log.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

/// Badge projection.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct AchievementSummary {
    /// Stable badge identifier.
    pub id: String,
    /// Display title.
    pub title: String,
}

impl From<Achievement> for AchievementSummary {
    fn from(value: Achievement) -> Self {
        Self {
            id: value.id().to_string(),
            title: value.title().to_string(),
        }
    }
}

/// Read-only props consumed by the presentation layer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConsoleSnapshot {
    /// Current player, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerSummary>,
    /// Navigation phase.
    pub phase: VisiblePhase,
    /// Increments on every navigation change.
    pub version: usize,
    /// Running activity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_game: Option<Activity>,
    /// Chosen category of a partitioned game.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_category: Option<String>,
    /// Categories offered while a partitioned game waits for a choice.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// Challenge currently served.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<Challenge>,
    /// Total score of the player session.
    pub score: u32,
    /// Consecutive correct answers.
    pub streak: u32,
    /// Best streak of the player session.
    pub max_streak: u32,
    /// Correct answers so far.
    pub tasks_completed: u32,
    /// Unlocked badges, in unlock order.
    pub achievements: Vec<AchievementSummary>,
    /// Set right after a badge unlock.
    pub show_celebration: bool,
    /// Live session assignment.
    pub live_session: LiveAssignmentDto,
    /// True when the store is unreachable; remote writes are skipped.
    pub degraded: bool,
}

impl ConsoleSnapshot {
    /// Capture the props of `console`.
    pub fn capture(console: &PlayerConsole, degraded: bool) -> Self {
        let scores = console.scores();
        let categories = match console.phase() {
            GamePhase::CategorySelecting(game_type) => console.library().categories(*game_type),
            _ => Vec::new(),
        };

        Self {
            player: console
                .player()
                .map(|player| PlayerSummary::new(player, console.session_pending())),
            phase: console.phase().into(),
            version: console.version(),
            current_game: console.current_game(),
            selected_category: console.selected_category().map(str::to_string),
            categories,
            challenge: console.current_challenge().cloned(),
            score: scores.total_score(),
            streak: scores.streak(),
            max_streak: scores.max_streak(),
            tasks_completed: scores.tasks_completed(),
            achievements: scores
                .achievements()
                .iter()
                .copied()
                .map(Into::into)
                .collect(),
            show_celebration: console.show_celebration(),
            live_session: console.live().into(),
            degraded,
        }
    }
}

/// Response to an answer.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerResponse {
    /// Echo of the reported outcome.
    pub correct: bool,
    /// Points added by this answer.
    pub points: u32,
    /// Total after this answer.
    pub total_score: u32,
    /// Streak after this answer.
    pub streak: u32,
    /// Best streak so far.
    pub max_streak: u32,
    /// Badges unlocked by this answer.
    pub unlocked: Vec<AchievementSummary>,
    /// Explanation of the answered challenge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Challenge to show next.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_challenge: Option<Challenge>,
    /// Encouragement for this answer.
    pub messages: Vec<PersonalizedMessage>,
}

/// A game and its categories, for the menu.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameCatalogEntry {
    /// Game identifier.
    pub game_type: GameType,
    /// Whether a category must be chosen first.
    pub category_partitioned: bool,
    /// Categories, empty for unpartitioned games.
    pub categories: Vec<String>,
    /// Challenges available in the library.
    pub challenge_count: usize,
}
