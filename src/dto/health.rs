use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Latest value of the `aiMessagesEnabled` setting.
    pub ai_messages_enabled: bool,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(ai_messages_enabled: bool) -> Self {
        Self {
            status: "ok".to_string(),
            ai_messages_enabled,
        }
    }

    /// Create a health response indicating the store is unreachable.
    pub fn degraded(ai_messages_enabled: bool) -> Self {
        Self {
            status: "degraded".to_string(),
            ai_messages_enabled,
        }
    }
}
