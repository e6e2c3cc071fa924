use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::player::{EndSessionResponse, PlayerOptions, PlayerSummary, SetPlayerRequest},
    error::AppError,
    services::player_service,
    state::SharedState,
};

/// Player identity and session lifecycle.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/player/options", get(player_options))
        .route("/player", post(set_player).delete(clear_player))
        .route("/player/session/end", post(end_session))
}

/// Grades and name limits accepted by the setup form.
#[utoipa::path(
    get,
    path = "/player/options",
    tag = "player",
    responses((status = 200, description = "Setup form limits", body = PlayerOptions))
)]
pub async fn player_options(State(state): State<SharedState>) -> Json<PlayerOptions> {
    Json(player_service::options(&state))
}

/// Set up the player; the remote session is created in the background.
#[utoipa::path(
    post,
    path = "/player",
    tag = "player",
    request_body = SetPlayerRequest,
    responses(
        (status = 200, description = "Player set up", body = PlayerSummary),
        (status = 400, description = "Blank name or unsupported grade")
    )
)]
pub async fn set_player(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<SetPlayerRequest>>,
) -> Result<Json<PlayerSummary>, AppError> {
    let setup = player_service::set_player(&state, payload).await?;
    Ok(Json(setup.summary))
}

/// Log out and reset the console.
#[utoipa::path(
    delete,
    path = "/player",
    tag = "player",
    responses((status = 204, description = "Player cleared"))
)]
pub async fn clear_player(State(state): State<SharedState>) -> StatusCode {
    player_service::clear_player(&state).await;
    StatusCode::NO_CONTENT
}

/// Unload beacon: submit final stats, best-effort.
#[utoipa::path(
    post,
    path = "/player/session/end",
    tag = "player",
    responses((status = 200, description = "Whether final stats were stored", body = EndSessionResponse))
)]
pub async fn end_session(State(state): State<SharedState>) -> Json<EndSessionResponse> {
    let submitted = player_service::end_current_session(&state).await;
    Json(EndSessionResponse { submitted })
}
