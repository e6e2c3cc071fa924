use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::{
    game::{AchievementSummary, ConsoleSnapshot},
    live::LiveAssignmentDto,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE event name; `None` sends an unnamed message.
    pub event: Option<String>,
    /// JSON payload.
    pub data: String,
}

impl ServerEvent {
    /// Event with a raw text payload.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream.
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
    /// Props at connection time.
    pub snapshot: ConsoleSnapshot,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    /// True while the store is unreachable.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast after every change of the console props.
pub struct ConsoleChangedEvent(pub ConsoleSnapshot);

#[derive(Debug, Serialize, ToSchema)]
/// One-shot celebration for a newly unlocked badge.
pub struct AchievementUnlockedEvent {
    /// Badge just earned.
    pub achievement: AchievementSummary,
    /// Score at the time of the unlock.
    pub total_score: u32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast when the live-session assignment changes.
pub struct LiveAssignmentEvent(pub LiveAssignmentDto);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the settings feed delivers a new value.
pub struct SettingsChangedEvent {
    /// Whether remote messages are enabled.
    pub ai_messages_enabled: bool,
}
