//! Mirrors score changes into the player's session log and the assigned live
//! session. Both writes are detached, independent and never retried.

use std::time::SystemTime;

use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dao::models::{GameResultEntity, PlayerAnswerEntity},
    state::{SharedState, catalog::Activity, console::SyncTarget, session::OutcomeReport},
};

/// Data of one scored action.
#[derive(Debug, Clone)]
pub struct ScoreUpdate {
    /// Activity that produced the outcome.
    pub activity: Activity,
    /// Bookkeeping after the outcome.
    pub report: OutcomeReport,
    /// Question answered, when known.
    pub question: Option<String>,
    /// Game-specific fields.
    pub details: serde_json::Map<String, serde_json::Value>,
}

/// Handles of the writes started by [`propagate`]; dropping them detaches the tasks.
#[derive(Debug, Default)]
pub struct SyncHandles {
    /// Append to the session log, when a session identifier was known.
    pub session_log: Option<JoinHandle<()>>,
    /// Append to the live results, when an active session was assigned.
    pub live_results: Option<JoinHandle<()>>,
}

impl SyncHandles {
    /// Wait for both writes; only tests and teardown need this.
    pub async fn join(self) {
        for handle in [self.session_log, self.live_results].into_iter().flatten() {
            if let Err(err) = handle.await {
                warn!(error = %err, "score sync task panicked");
            }
        }
    }
}

/// Start the remote writes for one outcome and return immediately.
pub async fn propagate(state: &SharedState, target: SyncTarget, update: ScoreUpdate) -> SyncHandles {
    if target.session_id.is_none() && target.live_session_id.is_none() {
        debug!("no remote target yet; outcome kept locally");
        return SyncHandles::default();
    }

    let store = match state.require_store().await {
        Ok(store) => store,
        Err(err) => {
            debug!(error = %err, "store unavailable; score sync skipped");
            return SyncHandles::default();
        }
    };

    let now = SystemTime::now();
    let label = update.activity.label().to_string();
    let report = &update.report;

    let session_log = target.session_id.map(|session_id| {
        let result = GameResultEntity {
            id: Uuid::new_v4().to_string(),
            game_type: label.clone(),
            points: report.points,
            score: report.total_score,
            streak: report.streak,
            correct: report.correct,
            question: update.question.clone(),
            details: update.details.clone(),
            recorded_at: now,
        };
        let write = store.save_game_result(session_id.clone(), result);
        tokio::spawn(async move {
            if let Err(err) = write.await {
                warn!(session_id = %session_id, error = %err, "failed to save game result");
            }
        })
    });

    let live_results = target.live_session_id.map(|live_session_id| {
        let answer = PlayerAnswerEntity {
            question: update.question.clone(),
            correct: report.correct,
            points: report.points,
            game_type: label.clone(),
            score: report.total_score,
            streak: report.streak,
            answered_at: now,
        };
        let write =
            store.update_live_session_result(live_session_id.clone(), target.player_name, answer);
        tokio::spawn(async move {
            if let Err(err) = write.await {
                warn!(
                    live_session_id = %live_session_id,
                    error = %err,
                    "failed to update live session results"
                );
            }
        })
    });

    SyncHandles {
        session_log,
        live_results,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        challenges::ChallengeLibrary,
        config::AppConfig,
        dao::{
            models::{ALL_PARTICIPANTS, LiveSessionDraft},
            store::{LiveSessionStore, SessionStore, memory::MemoryStore},
        },
        state::{AppState, catalog::GameType},
    };

    fn update(correct: bool) -> ScoreUpdate {
        ScoreUpdate {
            activity: Activity::game(GameType::Binary),
            report: OutcomeReport {
                correct,
                points: if correct { 10 } else { 0 },
                total_score: 10,
                streak: u32::from(correct),
                max_streak: 1,
                unlocked: Vec::new(),
            },
            question: Some("1010?".into()),
            details: Default::default(),
        }
    }

    async fn state_with(store: &MemoryStore) -> SharedState {
        let state = AppState::new(AppConfig::default(), ChallengeLibrary::default());
        state.set_store(Arc::new(store.clone())).await;
        state
    }

    #[tokio::test]
    async fn writes_both_sinks() {
        let store = MemoryStore::new();
        let session_id = store.create_session("Mia".into(), 2).await.unwrap();
        let live_id = store
            .create_live_session(LiveSessionDraft {
                title: "quiz".into(),
                activity: Activity::game(GameType::Binary),
                player_class: 2,
                participants: vec![ALL_PARTICIPANTS.into()],
            })
            .await
            .unwrap();
        let state = state_with(&store).await;

        let target = SyncTarget {
            player_name: "Mia".into(),
            session_id: Some(session_id.clone()),
            live_session_id: Some(live_id.clone()),
        };
        propagate(&state, target, update(true)).await.join().await;

        let results = store.game_results(&session_id);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].game_type, "binary");
        assert_eq!(results[0].points, 10);
        let live = store.live_session(&live_id).unwrap();
        assert_eq!(live.results["Mia"][0].question.as_deref(), Some("1010?"));
    }

    #[tokio::test]
    async fn one_failing_sink_does_not_affect_the_other() {
        let store = MemoryStore::new();
        let session_id = store.create_session("Mia".into(), 2).await.unwrap();
        let state = state_with(&store).await;

        let target = SyncTarget {
            player_name: "Mia".into(),
            session_id: Some(session_id.clone()),
            live_session_id: Some("deleted".into()),
        };
        propagate(&state, target, update(false)).await.join().await;

        let results = store.game_results(&session_id);
        assert_eq!(results.len(), 1);
        assert!(!results[0].correct);
    }

    #[tokio::test]
    async fn nothing_is_written_without_a_session_id() {
        let store = MemoryStore::new();
        let state = state_with(&store).await;
        let handles = propagate(
            &state,
            SyncTarget {
                player_name: "Mia".into(),
                session_id: None,
                live_session_id: None,
            },
            update(true),
        )
        .await;
        assert!(handles.session_log.is_none());
        assert!(handles.live_results.is_none());
    }

    #[tokio::test]
    async fn degraded_mode_skips_writes() {
        let state = AppState::new(AppConfig::default(), ChallengeLibrary::default());
        let handles = propagate(
            &state,
            SyncTarget {
                player_name: "Mia".into(),
                session_id: Some("s".into()),
                live_session_id: None,
            },
            update(true),
        )
        .await;
        assert!(handles.session_log.is_none());
    }
}
