use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report degraded mode and the published settings, logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "store health check failed");
            }
        }
        Err(_) => warn!("store unavailable (degraded mode)"),
    }

    let ai_messages_enabled = state.ai_messages_enabled();
    if state.is_degraded() {
        HealthResponse::degraded(ai_messages_enabled)
    } else {
        HealthResponse::ok(ai_messages_enabled)
    }
}
