use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{dto::live::LiveAssignmentDto, services::live_session_poller, state::SharedState};

/// Player view of the live-session assignment.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/live-sessions/assigned", get(assigned))
        .route("/live-sessions/refresh", post(refresh))
}

/// Live session currently assigned to the player.
#[utoipa::path(
    get,
    path = "/live-sessions/assigned",
    tag = "live",
    responses((status = 200, description = "Current assignment", body = LiveAssignmentDto))
)]
pub async fn assigned(State(state): State<SharedState>) -> Json<LiveAssignmentDto> {
    Json(live_session_poller::assignment(&state).await)
}

/// Poll the store now and return the resulting assignment.
#[utoipa::path(
    post,
    path = "/live-sessions/refresh",
    tag = "live",
    responses((status = 200, description = "Assignment after an immediate poll", body = LiveAssignmentDto))
)]
pub async fn refresh(State(state): State<SharedState>) -> Json<LiveAssignmentDto> {
    Json(live_session_poller::refresh(&state).await)
}
