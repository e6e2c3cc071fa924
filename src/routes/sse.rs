use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/player",
    tag = "sse",
    responses((status = 200, description = "Player SSE stream: handshake with the console props, then change events", content_type = "text/event-stream", body = String))
)]
/// Stream console changes, live assignments, messages and settings to the presentation layer.
pub async fn player_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let (receiver, handshake) = sse_service::subscribe_player(&state).await;
    info!("New player SSE connection");
    sse_service::to_sse_stream(receiver, handshake)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/player", get(player_stream))
}
