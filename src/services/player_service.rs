use std::time::Duration;

use tokio::{task::JoinHandle, time::timeout};
use tracing::{debug, info, warn};

use crate::{
    dao::models::SessionStatsEntity,
    dto::player::{PlayerOptions, PlayerSummary, SetPlayerRequest},
    error::ServiceError,
    services::{game_service, message_service::MessageKind, sse_events},
    state::{SharedState, player::SessionTicket},
};

/// Upper bound on the unload beacon.
pub const END_SESSION_TIMEOUT: Duration = Duration::from_secs(3);

/// Result of a player setup.
pub struct PlayerSetup {
    /// Identity as stored.
    pub summary: PlayerSummary,
    /// Remote session creation, when this setup started one.
    pub session_task: Option<JoinHandle<()>>,
}

/// Accepted grades and name limits.
pub fn options(state: &SharedState) -> PlayerOptions {
    PlayerOptions::new(state.config().supported_grades())
}

/// Validate and install the player, starting remote session creation once.
pub async fn set_player(
    state: &SharedState,
    request: SetPlayerRequest,
) -> Result<PlayerSetup, ServiceError> {
    let (ticket, summary, first_setup) = {
        let mut console = state.console().write().await;
        let first_setup = console.player().is_none();
        let ticket = console.set_player(
            &request.name,
            request.class_level,
            state.config().supported_grades(),
        )?;
        let summary = console
            .player()
            .map(|player| PlayerSummary::new(player, console.session_pending()))
            .ok_or_else(|| ServiceError::InvalidState("player was not stored".into()))?;
        (ticket, summary, first_setup)
    };

    info!(name = %summary.name, class_level = summary.class_level, "player set up");

    let session_task = ticket.map(|ticket| {
        let state = state.clone();
        tokio::spawn(async move { create_remote_session(&state, ticket).await })
    });

    sse_events::broadcast_console(state).await;
    state.request_poll();
    if first_setup {
        game_service::announce(state, MessageKind::Welcome).await;
    }

    Ok(PlayerSetup {
        summary,
        session_task,
    })
}

/// Create the remote session for `ticket` and record its identifier.
///
/// Failures leave the player without a session; score writes are skipped
/// until a later setup succeeds.
pub async fn create_remote_session(state: &SharedState, ticket: SessionTicket) {
    let store = match state.require_store().await {
        Ok(store) => store,
        Err(err) => {
            warn!(error = %err, "cannot create remote session");
            state.console().write().await.fail_session(&ticket);
            return;
        }
    };

    match store
        .create_session(ticket.name.clone(), ticket.class_level)
        .await
    {
        Ok(session_id) => {
            let stored = state
                .console()
                .write()
                .await
                .resolve_session(&ticket, session_id.clone());
            if stored {
                info!(session_id = %session_id, "remote session created");
                sse_events::broadcast_console(state).await;
            } else {
                debug!(session_id = %session_id, "discarding session created for a previous identity");
            }
        }
        Err(err) => {
            warn!(error = %err, "failed to create remote session");
            state.console().write().await.fail_session(&ticket);
        }
    }
}

/// Log out, discarding the remote session reference.
pub async fn clear_player(state: &SharedState) -> Option<PlayerSummary> {
    let cleared = state.console().write().await.clear_player();
    let summary = cleared.map(|player| PlayerSummary::new(&player, false));
    if let Some(summary) = &summary {
        info!(name = %summary.name, "player cleared");
    }
    sse_events::broadcast_console(state).await;
    summary
}

/// Submit final stats for the current session. Best-effort: failures are
/// logged and reported as `false`.
pub async fn end_current_session(state: &SharedState) -> bool {
    let (session_id, stats) = {
        let console = state.console().read().await;
        let Some(session_id) = console.player().and_then(|player| player.session_id.clone())
        else {
            debug!("no remote session to end");
            return false;
        };
        let scores = console.scores();
        let stats = SessionStatsEntity {
            total_score: scores.total_score(),
            max_streak: scores.max_streak(),
            achievements: scores
                .achievements()
                .iter()
                .map(|badge| badge.id().to_string())
                .collect(),
        };
        (session_id, stats)
    };

    let store = match state.require_store().await {
        Ok(store) => store,
        Err(err) => {
            warn!(session_id = %session_id, error = %err, "cannot end remote session");
            return false;
        }
    };

    match timeout(END_SESSION_TIMEOUT, store.end_session(session_id.clone(), stats)).await {
        Ok(Ok(())) => {
            info!(session_id = %session_id, "remote session ended");
            true
        }
        Ok(Err(err)) => {
            warn!(session_id = %session_id, error = %err, "failed to end remote session");
            false
        }
        Err(_) => {
            warn!(session_id = %session_id, error = %ServiceError::Timeout, "failed to end remote session");
            false
        }
    }
}
