use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        game::ConsoleSnapshot,
        live::LiveAssignmentDto,
        sse::{
            AchievementUnlockedEvent, ConsoleChangedEvent, LiveAssignmentEvent, ServerEvent,
            SettingsChangedEvent, SystemStatus,
        },
    },
    services::message_service::PersonalizedMessage,
    state::{SharedState, achievements::Achievement, console::LiveAssignment},
};

const EVENT_CONSOLE_CHANGED: &str = "console.changed";
const EVENT_ACHIEVEMENT_UNLOCKED: &str = "achievement.unlocked";
const EVENT_LIVE_ASSIGNMENT: &str = "live.assignment";
const EVENT_MESSAGE: &str = "message";
const EVENT_SETTINGS_CHANGED: &str = "settings.changed";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast the current console props.
pub async fn broadcast_console(state: &SharedState) {
    let snapshot = {
        let console = state.console().read().await;
        ConsoleSnapshot::capture(&console, state.is_degraded())
    };
    send_event(state, EVENT_CONSOLE_CHANGED, &ConsoleChangedEvent(snapshot));
}

/// Broadcast one celebration per unlocked badge.
pub fn broadcast_achievements(state: &SharedState, unlocked: &[Achievement], total_score: u32) {
    for achievement in unlocked {
        let payload = AchievementUnlockedEvent {
            achievement: (*achievement).into(),
            total_score,
        };
        send_event(state, EVENT_ACHIEVEMENT_UNLOCKED, &payload);
    }
}

/// Broadcast the live-session assignment after it changed.
pub fn broadcast_live_assignment(state: &SharedState, assignment: &LiveAssignment) {
    let payload = LiveAssignmentEvent(LiveAssignmentDto::from(assignment));
    send_event(state, EVENT_LIVE_ASSIGNMENT, &payload);
}

/// Broadcast an encouragement message.
pub fn broadcast_message(state: &SharedState, message: &PersonalizedMessage) {
    send_event(state, EVENT_MESSAGE, message);
}

/// Broadcast a new settings value.
pub fn broadcast_settings(state: &SharedState, ai_messages_enabled: bool) {
    send_event(
        state,
        EVENT_SETTINGS_CHANGED,
        &SettingsChangedEvent {
            ai_messages_enabled,
        },
    );
}

/// Broadcast a degraded-mode transition.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

fn send_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{challenges::ChallengeLibrary, config::AppConfig, state::AppState};

    #[tokio::test]
    async fn one_event_per_unlocked_badge() {
        let state = AppState::new(AppConfig::default(), ChallengeLibrary::default());
        let mut receiver = state.sse().subscribe();

        broadcast_achievements(&state, &[Achievement::FirstWin, Achievement::Score50], 60);

        let first = receiver.recv().await.unwrap();
        let second = receiver.recv().await.unwrap();
        assert_eq!(first.event.as_deref(), Some(EVENT_ACHIEVEMENT_UNLOCKED));
        assert!(first.data.contains("first_win"));
        assert!(second.data.contains("score_50"));
        assert!(receiver.try_recv().is_err());
    }
}
