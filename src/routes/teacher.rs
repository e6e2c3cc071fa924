use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
};
use axum_valid::Valid;

use crate::{
    dto::{
        live::{CreateLiveSessionRequest, CreatedResponse, LiveSessionSummary},
        settings::SettingsDto,
    },
    error::AppError,
    services::{settings_service, teacher_service},
    state::SharedState,
};

const TEACHER_TOKEN_HEADER: &str = "x-teacher-token";

/// Teacher-only endpoints for broadcasts and global settings.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route(
            "/teacher/live-sessions",
            get(list_live_sessions).post(create_live_session),
        )
        .route("/teacher/live-sessions/active", get(active_live_sessions))
        .route("/teacher/live-sessions/{id}/end", post(end_live_session))
        .route("/teacher/live-sessions/{id}", delete(delete_live_session))
        .route("/teacher/settings", get(get_settings).put(update_settings))
        .route_layer(middleware::from_fn_with_state(state, require_teacher_token))
}

/// Every live session with its results.
#[utoipa::path(
    get,
    path = "/teacher/live-sessions",
    tag = "teacher",
    params(("X-Teacher-Token" = String, Header, description = "Token configured as `teacher_token`")),
    responses((status = 200, description = "All live sessions", body = [LiveSessionSummary]))
)]
pub async fn list_live_sessions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<LiveSessionSummary>>, AppError> {
    Ok(Json(teacher_service::list_live_sessions(&state).await?))
}

#[utoipa::path(
    get,
    path = "/teacher/live-sessions/active",
    tag = "teacher",
    params(("X-Teacher-Token" = String, Header, description = "Token configured as `teacher_token`")),
    responses((status = 200, description = "Running live sessions", body = [LiveSessionSummary]))
)]
pub async fn active_live_sessions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<LiveSessionSummary>>, AppError> {
    Ok(Json(teacher_service::active_live_sessions(&state).await?))
}

/// Start a broadcast.
#[utoipa::path(
    post,
    path = "/teacher/live-sessions",
    tag = "teacher",
    params(("X-Teacher-Token" = String, Header, description = "Token configured as `teacher_token`")),
    request_body = CreateLiveSessionRequest,
    responses(
        (status = 201, description = "Live session created", body = CreatedResponse),
        (status = 400, description = "Invalid draft")
    )
)]
pub async fn create_live_session(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateLiveSessionRequest>>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let created = teacher_service::create_live_session(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Mark a broadcast completed.
#[utoipa::path(
    post,
    path = "/teacher/live-sessions/{id}/end",
    tag = "teacher",
    params(
        ("X-Teacher-Token" = String, Header, description = "Token configured as `teacher_token`"),
        ("id" = String, Path, description = "Identifier of the live session")
    ),
    responses(
        (status = 204, description = "Live session ended"),
        (status = 404, description = "Unknown live session")
    )
)]
pub async fn end_live_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    teacher_service::end_live_session(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/teacher/live-sessions/{id}",
    tag = "teacher",
    params(
        ("X-Teacher-Token" = String, Header, description = "Token configured as `teacher_token`"),
        ("id" = String, Path, description = "Identifier of the live session")
    ),
    responses(
        (status = 204, description = "Live session deleted"),
        (status = 404, description = "Unknown live session")
    )
)]
pub async fn delete_live_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    teacher_service::delete_live_session(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Global settings.
#[utoipa::path(
    get,
    path = "/teacher/settings",
    tag = "teacher",
    params(("X-Teacher-Token" = String, Header, description = "Token configured as `teacher_token`")),
    responses((status = 200, description = "Current settings", body = SettingsDto))
)]
pub async fn get_settings(State(state): State<SharedState>) -> Result<Json<SettingsDto>, AppError> {
    Ok(Json(settings_service::get_settings(&state).await?))
}

/// Replace the global settings.
#[utoipa::path(
    put,
    path = "/teacher/settings",
    tag = "teacher",
    params(("X-Teacher-Token" = String, Header, description = "Token configured as `teacher_token`")),
    request_body = SettingsDto,
    responses((status = 200, description = "Settings saved", body = SettingsDto))
)]
pub async fn update_settings(
    State(state): State<SharedState>,
    Json(payload): Json<SettingsDto>,
) -> Result<Json<SettingsDto>, AppError> {
    Ok(Json(
        settings_service::update_settings(&state, payload).await?,
    ))
}

async fn require_teacher_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(TEACHER_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
        .ok_or_else(|| {
            AppError::Unauthorized("missing teacher token header `X-Teacher-Token`".into())
        })?;

    match state.config().teacher_token() {
        Some(token) if token == provided.as_str() => Ok(next.run(req).await),
        Some(_) => Err(AppError::Unauthorized("invalid teacher token".into())),
        None => Err(AppError::Unauthorized(
            "teacher access is disabled: no token configured".into(),
        )),
    }
}
