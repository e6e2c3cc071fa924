use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Console snapshots, intents and answers.
pub mod game;
/// Health check payload.
pub mod health;
/// Live-session requests and projections.
pub mod live;
/// Navigation phase as seen by clients.
pub mod phase;
/// Player setup payloads.
pub mod player;
/// Teacher-controlled settings.
pub mod settings;
/// Server-sent event payloads.
pub mod sse;
/// Custom request validators.
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
