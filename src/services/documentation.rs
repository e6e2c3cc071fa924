use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the CodeQuest backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::player_stream,
        crate::routes::player::player_options,
        crate::routes::player::set_player,
        crate::routes::player::clear_player,
        crate::routes::player::end_session,
        crate::routes::game::snapshot,
        crate::routes::game::catalog,
        crate::routes::game::start_game,
        crate::routes::game::select_category,
        crate::routes::game::back_to_menu,
        crate::routes::game::answer,
        crate::routes::game::help,
        crate::routes::live::assigned,
        crate::routes::live::refresh,
        crate::routes::teacher::list_live_sessions,
        crate::routes::teacher::active_live_sessions,
        crate::routes::teacher::create_live_session,
        crate::routes::teacher::end_live_session,
        crate::routes::teacher::delete_live_session,
        crate::routes::teacher::get_settings,
        crate::routes::teacher::update_settings,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::AchievementUnlockedEvent,
            crate::dto::sse::SettingsChangedEvent,
            crate::dto::game::ConsoleSnapshot,
            crate::dto::live::LiveSessionSummary,
            crate::dto::phase::VisiblePhase,
            crate::state::catalog::Activity,
            crate::state::catalog::GameType,
            crate::dao::models::LiveSessionStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "player", description = "Player identity and session lifecycle"),
        (name = "game", description = "Menu navigation, challenges and answers"),
        (name = "live", description = "Live-session assignment of the player"),
        (name = "teacher", description = "Live-session management and settings, guarded by `X-Teacher-Token`"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_session_results_are_documented_as_a_map() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let results = &doc["components"]["schemas"]["LiveSessionSummary"]["properties"]["results"];
        assert_eq!(results["type"], "object");
        assert!(results.get("additionalProperties").is_some());
        assert!(doc["paths"].get("/teacher/live-sessions").is_some());
    }
}
