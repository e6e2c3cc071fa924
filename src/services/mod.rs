/// OpenAPI documentation generation.
pub mod documentation;
/// Menu navigation, answers and encouragement messages.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Background poller keeping the live-session assignment current.
pub mod live_session_poller;
/// Choice of the live session applying to a player.
pub mod live_session_resolver;
/// Remote and templated encouragement messages.
pub mod message_service;
/// Player setup, logout and the unload beacon.
pub mod player_service;
/// Mirrors of score changes into the store.
pub mod score_sync;
/// Settings feed and teacher settings operations.
pub mod settings_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Store connection supervisor toggling degraded mode.
pub mod storage_supervisor;
/// Teacher management of live sessions.
pub mod teacher_service;
