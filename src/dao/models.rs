use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::catalog::Activity;

/// Sentinel participant meaning "every player of the target class".
pub const ALL_PARTICIPANTS: &str = "all";

/// Remote record of one player's play period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionEntity {
    /// Opaque identifier assigned by the store.
    pub id: String,
    /// Player name at creation time.
    pub player_name: String,
    /// Player grade at creation time.
    pub class_level: u8,
    /// Creation timestamp.
    pub started_at: SystemTime,
    /// Set when the session was ended.
    #[serde(default)]
    pub ended_at: Option<SystemTime>,
    /// Aggregate stats submitted at the end of the session.
    #[serde(default)]
    pub final_stats: Option<SessionStatsEntity>,
}

/// Aggregate stats submitted when a session ends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionStatsEntity {
    /// Final total score.
    pub total_score: u32,
    /// Best streak of the session.
    pub max_streak: u32,
    /// Unlocked achievement identifiers in unlock order.
    pub achievements: Vec<String>,
}

/// One scored action, written once and never updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameResultEntity {
    /// Identifier of this record.
    pub id: String,
    /// Game label (`binary`, ..., or `custom_test`).
    pub game_type: String,
    /// Points earned by the action.
    pub points: u32,
    /// Total score after the action.
    pub score: u32,
    /// Streak after the action.
    pub streak: u32,
    /// Whether the answer was correct.
    pub correct: bool,
    /// Question answered, when known.
    #[serde(default)]
    pub question: Option<String>,
    /// Free-form game-specific fields.
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,
    /// Time the action was recorded locally.
    pub recorded_at: SystemTime,
}

/// Lifecycle of a live session as observed by players.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LiveSessionStatus {
    /// Broadcast is running; matching players are forced into it.
    Active,
    /// Broadcast ended; viewable but never forced.
    Completed,
    /// Any other value written by a foreign client.
    #[serde(other)]
    Unknown,
}

/// One player's answer inside a live session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerAnswerEntity {
    /// Question answered, when known.
    #[serde(default)]
    pub question: Option<String>,
    /// Whether the answer was correct.
    pub correct: bool,
    /// Points earned.
    pub points: u32,
    /// Game label of the answer.
    pub game_type: String,
    /// Player total after the answer.
    pub score: u32,
    /// Player streak after the answer.
    pub streak: u32,
    /// Time the answer was recorded locally.
    pub answered_at: SystemTime,
}

/// Teacher-initiated broadcast.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiveSessionEntity {
    /// Identifier assigned by the store.
    pub id: String,
    /// Title shown to the teacher and players.
    pub title: String,
    /// Game or custom test players are sent to.
    pub activity: Activity,
    /// Target grade.
    pub player_class: u8,
    /// Player names, or [`ALL_PARTICIPANTS`].
    pub participants: Vec<String>,
    /// Current status.
    pub status: LiveSessionStatus,
    /// Creation timestamp; orders completed sessions.
    pub created_at: SystemTime,
    /// Set when the teacher ended the broadcast.
    #[serde(default)]
    pub ended_at: Option<SystemTime>,
    /// Answers keyed by player name; each player only writes under their own key.
    #[serde(default)]
    pub results: IndexMap<String, Vec<PlayerAnswerEntity>>,
}

impl LiveSessionEntity {
    /// Build a fresh active session from a teacher draft.
    pub fn from_draft(id: String, draft: LiveSessionDraft) -> Self {
        Self {
            id,
            title: draft.title,
            activity: draft.activity,
            player_class: draft.player_class,
            participants: draft.participants,
            status: LiveSessionStatus::Active,
            created_at: SystemTime::now(),
            ended_at: None,
            results: IndexMap::new(),
        }
    }

    /// Whether the broadcast targets `player_name`.
    pub fn includes(&self, player_name: &str) -> bool {
        self.participants
            .iter()
            .any(|participant| participant == ALL_PARTICIPANTS || participant == player_name)
    }

    /// Mark the broadcast as completed.
    pub fn complete(&mut self) {
        self.status = LiveSessionStatus::Completed;
        self.ended_at.get_or_insert_with(SystemTime::now);
    }
}

/// Data supplied by the teacher to start a live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSessionDraft {
    /// Title of the broadcast.
    pub title: String,
    /// Activity players are sent to.
    pub activity: Activity,
    /// Target grade.
    pub player_class: u8,
    /// Player names, or [`ALL_PARTICIPANTS`].
    pub participants: Vec<String>,
}

/// Global settings document.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingsEntity {
    /// Whether encouragement messages may be generated remotely.
    #[serde(default)]
    pub ai_messages_enabled: bool,
}
