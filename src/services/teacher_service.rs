//! Teacher-side management of live sessions.

use tracing::info;

use crate::{
    dao::models::LiveSessionDraft,
    dto::live::{CreateLiveSessionRequest, CreatedResponse, LiveSessionSummary},
    error::ServiceError,
    state::SharedState,
};

/// Every live session, oldest first.
pub async fn list_live_sessions(
    state: &SharedState,
) -> Result<Vec<LiveSessionSummary>, ServiceError> {
    let store = state.require_store().await?;
    let sessions = store.get_all_live_sessions().await?;
    Ok(sessions.into_iter().map(Into::into).collect())
}

/// Running live sessions, oldest first.
pub async fn active_live_sessions(
    state: &SharedState,
) -> Result<Vec<LiveSessionSummary>, ServiceError> {
    let store = state.require_store().await?;
    let sessions = store.get_active_live_sessions().await?;
    Ok(sessions.into_iter().map(Into::into).collect())
}

/// Start a broadcast.
pub async fn create_live_session(
    state: &SharedState,
    request: CreateLiveSessionRequest,
) -> Result<CreatedResponse, ServiceError> {
    let supported = state.config().supported_grades();
    if !supported.contains(&request.player_class) {
        return Err(ServiceError::InvalidInput(format!(
            "unsupported class level {} (supported: {supported:?})",
            request.player_class
        )));
    }

    let draft = LiveSessionDraft::from(request);
    let store = state.require_store().await?;
    let id = store.create_live_session(draft.clone()).await?;
    info!(
        live_session_id = %id,
        title = %draft.title,
        activity = draft.activity.label(),
        player_class = draft.player_class,
        "live session created"
    );
    state.request_poll();
    Ok(CreatedResponse { id })
}

/// Mark a broadcast completed.
pub async fn end_live_session(state: &SharedState, id: &str) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    if !store.end_live_session(id.to_string()).await? {
        return Err(ServiceError::NotFound(format!("live session `{id}` not found")));
    }
    info!(live_session_id = %id, "live session ended");
    state.request_poll();
    Ok(())
}

/// Remove a broadcast and its results.
pub async fn delete_live_session(state: &SharedState, id: &str) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    if !store.delete_live_session(id.to_string()).await? {
        return Err(ServiceError::NotFound(format!("live session `{id}` not found")));
    }
    info!(live_session_id = %id, "live session deleted");
    state.request_poll();
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        challenges::ChallengeLibrary,
        config::AppConfig,
        dao::{models::LiveSessionStatus, store::memory::MemoryStore},
        state::{
            AppState,
            catalog::{Activity, GameType},
        },
    };

    fn request(player_class: u8) -> CreateLiveSessionRequest {
        CreateLiveSessionRequest {
            title: "  Binary warm-up ".into(),
            activity: Activity::game(GameType::Binary),
            player_class,
            participants: vec!["all".into()],
        }
    }

    async fn state_with(store: &MemoryStore) -> SharedState {
        let state = AppState::new(AppConfig::default(), ChallengeLibrary::default());
        state.set_store(Arc::new(store.clone())).await;
        state
    }

    #[tokio::test]
    async fn create_end_and_delete() {
        let store = MemoryStore::new();
        let state = state_with(&store).await;

        let created = create_live_session(&state, request(3)).await.unwrap();
        assert_eq!(store.live_session(&created.id).unwrap().title, "Binary warm-up");
        assert_eq!(active_live_sessions(&state).await.unwrap().len(), 1);

        end_live_session(&state, &created.id).await.unwrap();
        assert!(active_live_sessions(&state).await.unwrap().is_empty());
        let listed = list_live_sessions(&state).await.unwrap();
        assert_eq!(listed[0].status, LiveSessionStatus::Completed);
        assert!(listed[0].ended_at.is_some());

        delete_live_session(&state, &created.id).await.unwrap();
        assert!(list_live_sessions(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_ids_and_grades_are_rejected() {
        let store = MemoryStore::new();
        let state = state_with(&store).await;

        assert!(matches!(
            create_live_session(&state, request(9)).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            end_live_session(&state, "missing").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            delete_live_session(&state, "missing").await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
