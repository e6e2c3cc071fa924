//! Settings feed: keeps the `aiMessagesEnabled` flag in sync with the store.

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::{
    dto::settings::SettingsDto, error::ServiceError, services::sse_events, state::SharedState,
};

/// Refresh the settings on the configured cadence.
pub async fn run(state: SharedState) {
    let mut ticker = interval(state.config().settings_poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        refresh(&state).await;
    }
}

/// Read the settings once and publish them.
///
/// An unreachable store publishes `false` so messages fall back to templates.
pub async fn refresh(state: &SharedState) -> bool {
    let enabled = match state.require_store().await {
        Ok(store) => match store.load_settings().await {
            Ok(settings) => settings.ai_messages_enabled,
            Err(err) => {
                warn!(error = %err, "failed to load settings");
                false
            }
        },
        Err(err) => {
            debug!(error = %err, "settings refresh skipped");
            false
        }
    };
    publish(state, enabled);
    enabled
}

/// Current settings as stored.
pub async fn get_settings(state: &SharedState) -> Result<SettingsDto, ServiceError> {
    let store = state.require_store().await?;
    let settings = store.load_settings().await?;
    Ok(settings.into())
}

/// Replace the settings and publish the new value right away.
pub async fn update_settings(
    state: &SharedState,
    settings: SettingsDto,
) -> Result<SettingsDto, ServiceError> {
    let store = state.require_store().await?;
    store.save_settings(settings.into()).await?;
    info!(
        ai_messages_enabled = settings.ai_messages_enabled,
        "settings updated"
    );
    publish(state, settings.ai_messages_enabled);
    Ok(settings)
}

fn publish(state: &SharedState, enabled: bool) {
    if state.publish_ai_messages(enabled) {
        info!(ai_messages_enabled = enabled, "settings changed");
        sse_events::broadcast_settings(state, enabled);
    }
}
