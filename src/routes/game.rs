use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::game::{
        AnswerRequest, AnswerResponse, ConsoleSnapshot, GameCatalogEntry, SelectCategoryRequest,
        StartGameRequest,
    },
    error::AppError,
    services::{game_service, message_service::PersonalizedMessage},
    state::SharedState,
};

/// Navigation and answers of the single player console.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/game", get(snapshot))
        .route("/game/catalog", get(catalog))
        .route("/game/start", post(start_game))
        .route("/game/category", post(select_category))
        .route("/game/back", post(back_to_menu))
        .route("/game/answer", post(answer))
        .route("/game/help", post(help))
}

/// Current console props.
#[utoipa::path(
    get,
    path = "/game",
    tag = "game",
    responses((status = 200, description = "Console props", body = ConsoleSnapshot))
)]
pub async fn snapshot(State(state): State<SharedState>) -> Json<ConsoleSnapshot> {
    Json(game_service::snapshot(&state).await)
}

#[utoipa::path(
    get,
    path = "/game/catalog",
    tag = "game",
    responses((status = 200, description = "Games offered by the menu", body = [GameCatalogEntry]))
)]
pub async fn catalog(State(state): State<SharedState>) -> Json<Vec<GameCatalogEntry>> {
    Json(game_service::catalog(&state).await)
}

/// Pick a game from the menu.
#[utoipa::path(
    post,
    path = "/game/start",
    tag = "game",
    request_body = StartGameRequest,
    responses(
        (status = 200, description = "Game started or waiting for a category", body = ConsoleSnapshot),
        (status = 409, description = "No player or a game is already running")
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    Json(payload): Json<StartGameRequest>,
) -> Result<Json<ConsoleSnapshot>, AppError> {
    Ok(Json(
        game_service::start_game(&state, payload.game_type).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/game/category",
    tag = "game",
    request_body = SelectCategoryRequest,
    responses(
        (status = 200, description = "Category selected", body = ConsoleSnapshot),
        (status = 400, description = "Unknown category"),
        (status = 409, description = "No game is waiting for a category")
    )
)]
pub async fn select_category(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<SelectCategoryRequest>>,
) -> Result<Json<ConsoleSnapshot>, AppError> {
    Ok(Json(
        game_service::select_category(&state, &payload.category).await?,
    ))
}

/// Back to the menu; scores are kept.
#[utoipa::path(
    post,
    path = "/game/back",
    tag = "game",
    responses((status = 200, description = "Menu shown", body = ConsoleSnapshot))
)]
pub async fn back_to_menu(State(state): State<SharedState>) -> Json<ConsoleSnapshot> {
    Json(game_service::back_to_menu(&state).await)
}

/// Report the outcome of the current challenge.
#[utoipa::path(
    post,
    path = "/game/answer",
    tag = "game",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Outcome recorded", body = AnswerResponse),
        (status = 409, description = "No game is running")
    )
)]
pub async fn answer(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<AnswerRequest>>,
) -> Result<Json<AnswerResponse>, AppError> {
    Ok(Json(game_service::answer(&state, payload).await?))
}

#[utoipa::path(
    post,
    path = "/game/help",
    tag = "game",
    responses((status = 200, description = "Hint for the running game", body = PersonalizedMessage))
)]
pub async fn help(State(state): State<SharedState>) -> Result<Json<PersonalizedMessage>, AppError> {
    Ok(Json(game_service::help(&state).await?))
}
