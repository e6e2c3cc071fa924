use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{LiveSessionDraft, LiveSessionEntity, LiveSessionStatus, PlayerAnswerEntity},
    dto::{
        format_system_time,
        validation::{validate_not_blank, validate_participants},
    },
    state::{catalog::Activity, console::LiveAssignment},
};

/// Teacher form starting a broadcast.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateLiveSessionRequest {
    /// Title shown to players.
    #[validate(custom(function = "validate_not_blank"), length(max = 120))]
    pub title: String,
    /// Game or custom test pushed to players.
    pub activity: Activity,
    /// Target grade.
    pub player_class: u8,
    /// Player names, or `["all"]`.
    #[validate(custom(function = "validate_participants"))]
    pub participants: Vec<String>,
}

impl From<CreateLiveSessionRequest> for LiveSessionDraft {
    fn from(value: CreateLiveSessionRequest) -> Self {
        Self {
            title: value.title.trim().to_string(),
            activity: value.activity,
            player_class: value.player_class,
            participants: value
                .participants
                .into_iter()
                .map(|name| name.trim().to_string())
                .collect(),
        }
    }
}

/// Identifier of a freshly created record.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedResponse {
    /// Identifier of the new record.
    pub id: String,
}

/// One answer as listed in the teacher view.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerAnswerSummary {
    /// Question text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// Whether the answer was correct.
    pub correct: bool,
    /// Points awarded.
    pub points: u32,
    /// Game the answer came from.
    pub game_type: String,
    /// Player total after the answer.
    pub score: u32,
    /// Player streak after the answer.
    pub streak: u32,
    /// RFC 3339 timestamp.
    pub answered_at: String,
}

impl From<PlayerAnswerEntity> for PlayerAnswerSummary {
    fn from(value: PlayerAnswerEntity) -> Self {
        Self {
            question: value.question,
            correct: value.correct,
            points: value.points,
            game_type: value.game_type,
            score: value.score,
            streak: value.streak,
            answered_at: format_system_time(value.answered_at),
        }
    }
}

/// Live session projection shared by the teacher and player views.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LiveSessionSummary {
    /// Live session identifier.
    pub id: String,
    /// Title shown to players.
    pub title: String,
    /// Assigned activity.
    pub activity: Activity,
    /// Target grade.
    pub player_class: u8,
    /// Player names, or `["all"]`.
    pub participants: Vec<String>,
    /// Lifecycle status.
    pub status: LiveSessionStatus,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// RFC 3339 end time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
    /// Answers per player name.
    pub results: IndexMap<String, Vec<PlayerAnswerSummary>>,
}

impl From<LiveSessionEntity> for LiveSessionSummary {
    fn from(value: LiveSessionEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            activity: value.activity,
            player_class: value.player_class,
            participants: value.participants,
            status: value.status,
            created_at: format_system_time(value.created_at),
            ended_at: value.ended_at.map(format_system_time),
            results: value
                .results
                .into_iter()
                .map(|(name, answers)| {
                    (name, answers.into_iter().map(Into::into).collect())
                })
                .collect(),
        }
    }
}

/// Kind of assignment held by the console.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentKind {
    /// Free play.
    None,
    /// Running broadcast, forced on the player.
    Active,
    /// Finished broadcast, available for review.
    Completed,
}

/// Live session currently assigned to the player.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LiveAssignmentDto {
    /// Assignment state.
    pub kind: AssignmentKind,
    /// Assigned session, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<LiveSessionSummary>,
}

impl From<&LiveAssignment> for LiveAssignmentDto {
    fn from(value: &LiveAssignment) -> Self {
        let kind = match value {
            LiveAssignment::None => AssignmentKind::None,
            LiveAssignment::Active(_) => AssignmentKind::Active,
            LiveAssignment::Completed(_) => AssignmentKind::Completed,
        };
        Self {
            kind,
            session: value.session().cloned().map(Into::into),
        }
    }
}
