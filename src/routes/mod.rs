use axum::Router;

use crate::state::SharedState;

pub(crate) mod docs;
pub(crate) mod game;
pub(crate) mod health;
pub(crate) mod live;
pub(crate) mod player;
pub(crate) mod sse;
pub(crate) mod teacher;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(player::router())
        .merge(game::router())
        .merge(live::router())
        .merge(teacher::router(state.clone()));

    api_router.merge(docs::router()).with_state(state)
}
