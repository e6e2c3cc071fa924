//! Periodic lookup of the live session assigned to the current player.

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::{
    dto::live::LiveAssignmentDto,
    services::{live_session_resolver, sse_events},
    state::{SharedState, console::ResolutionEffect},
};

/// Poll the store on the configured cadence, or earlier when asked.
pub async fn run(state: SharedState) {
    let mut ticker = interval(state.config().poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = state.poll_trigger().notified() => {
                debug!("live session poll requested");
                ticker.reset();
            }
        }
        poll_once(&state).await;
    }
}

/// Live session currently assigned to the player.
pub async fn assignment(state: &SharedState) -> LiveAssignmentDto {
    let console = state.console().read().await;
    LiveAssignmentDto::from(console.live())
}

/// Resolve right away instead of waiting for the next tick.
pub async fn refresh(state: &SharedState) -> LiveAssignmentDto {
    poll_once(state).await;
    assignment(state).await
}

/// Run one resolution pass; returns what changed.
///
/// A failed fetch keeps the current assignment.
pub async fn poll_once(state: &SharedState) -> Option<ResolutionEffect> {
    let identity = {
        let console = state.console().read().await;
        console
            .player()
            .map(|player| (player.name.clone(), player.class_level))
    };
    let (name, class_level) = identity?;

    let store = match state.require_store().await {
        Ok(store) => store,
        Err(err) => {
            debug!(error = %err, "live session poll skipped");
            return None;
        }
    };

    let sessions = match store.get_all_live_sessions().await {
        Ok(sessions) => sessions,
        Err(err) => {
            warn!(error = %err, "failed to fetch live sessions");
            return None;
        }
    };

    let resolution = live_session_resolver::resolve(sessions, &name, class_level);

    let (effect, assignment) = {
        let mut console = state.console().write().await;
        let unchanged_identity = console
            .player()
            .is_some_and(|player| player.name == name && player.class_level == class_level);
        if !unchanged_identity {
            debug!("player changed during live session poll; discarding result");
            return None;
        }
        let effect = console.apply_resolution(resolution);
        (effect, console.live().clone())
    };

    match &effect {
        ResolutionEffect::Forced {
            live_session_id,
            activity,
        } => {
            info!(
                live_session_id = %live_session_id,
                activity = activity.label(),
                "live session forced"
            );
        }
        ResolutionEffect::Released => info!("live session ended; back to free play"),
        ResolutionEffect::Reassigned => debug!("live session assignment changed"),
        ResolutionEffect::Unchanged => return Some(effect),
    }

    sse_events::broadcast_live_assignment(state, &assignment);
    sse_events::broadcast_console(state).await;
    Some(effect)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{
        challenges::ChallengeLibrary,
        config::{AppConfig, MAX_POLL_INTERVAL},
        dao::{
            models::LiveSessionDraft,
            store::{LiveSessionStore, memory::MemoryStore},
        },
        state::{
            AppState,
            catalog::{Activity, GameType},
            console::LiveAssignment,
        },
    };

    async fn state_with(store: &MemoryStore, name: &str, class_level: u8) -> SharedState {
        let state = AppState::new(AppConfig::default(), ChallengeLibrary::builtin());
        state.set_store(Arc::new(store.clone())).await;
        state
            .console()
            .write()
            .await
            .set_player(name, class_level, &[2, 3, 4, 5])
            .unwrap();
        state
    }

    fn draft(title: &str, class_level: u8, participants: &[&str]) -> LiveSessionDraft {
        LiveSessionDraft {
            title: title.into(),
            activity: Activity::game(GameType::Flowchart),
            player_class: class_level,
            participants: participants.iter().map(|name| name.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn no_player_means_no_poll() {
        let state = AppState::new(AppConfig::default(), ChallengeLibrary::builtin());
        assert_eq!(poll_once(&state).await, None);
    }

    #[tokio::test]
    async fn active_session_for_the_player_is_forced() {
        let store = MemoryStore::new();
        let id = store
            .create_live_session(draft("quiz", 3, &["Mia"]))
            .await
            .unwrap();
        store
            .create_live_session(draft("other grade", 4, &["all"]))
            .await
            .unwrap();
        let state = state_with(&store, "Mia", 3).await;

        let effect = poll_once(&state).await.unwrap();
        assert!(
            matches!(effect, ResolutionEffect::Forced { ref live_session_id, .. } if *live_session_id == id)
        );
        assert_eq!(
            state.console().read().await.current_game(),
            Some(Activity::game(GameType::Flowchart))
        );
        assert_eq!(poll_once(&state).await, Some(ResolutionEffect::Unchanged));
    }

    #[tokio::test]
    async fn ending_the_session_releases_the_player() {
        let store = MemoryStore::new();
        let id = store
            .create_live_session(draft("quiz", 3, &["all"]))
            .await
            .unwrap();
        let state = state_with(&store, "Mia", 3).await;
        poll_once(&state).await;

        store.end_live_session(id).await.unwrap();
        assert_eq!(poll_once(&state).await, Some(ResolutionEffect::Released));
        let console = state.console().read().await;
        assert_eq!(console.current_game(), None);
        assert!(matches!(console.live(), LiveAssignment::Completed(_)));
    }

    #[tokio::test]
    async fn failed_fetch_keeps_the_assignment() {
        let store = MemoryStore::new();
        store
            .create_live_session(draft("quiz", 3, &["Mia"]))
            .await
            .unwrap();
        let state = state_with(&store, "Mia", 3).await;
        poll_once(&state).await;

        store.set_failing(true);
        assert_eq!(poll_once(&state).await, None);
        assert!(matches!(
            state.console().read().await.live(),
            LiveAssignment::Active(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_poller_stops_polling() {
        let store = MemoryStore::new();
        let id = store
            .create_live_session(draft("quiz", 3, &["all"]))
            .await
            .unwrap();
        let state = state_with(&store, "Mia", 3).await;
        state.register_task(tokio::spawn(run(state.clone()))).await;

        for _ in 0..100 {
            if matches!(state.console().read().await.live(), LiveAssignment::Active(_)) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(matches!(
            state.console().read().await.live(),
            LiveAssignment::Active(_)
        ));

        state.abort_tasks().await;
        store.end_live_session(id).await.unwrap();
        state.request_poll();
        tokio::time::sleep(MAX_POLL_INTERVAL * 3).await;

        let console = state.console().read().await;
        assert!(matches!(console.live(), LiveAssignment::Active(_)));
        assert_eq!(
            console.current_game(),
            Some(Activity::game(GameType::Flowchart))
        );
    }
}
