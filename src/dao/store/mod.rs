/// CouchDB backend.
#[cfg(feature = "couch-store")]
pub mod couchdb;
/// In-process backend.
pub mod memory;

use futures::future::BoxFuture;

use crate::dao::{
    models::{
        GameResultEntity, LiveSessionDraft, LiveSessionEntity, PlayerAnswerEntity,
        SessionStatsEntity, SettingsEntity,
    },
    storage::StorageResult,
};

/// Persistence of player sessions and their result log.
pub trait SessionStore: Send + Sync {
    /// Create a session record and return its identifier.
    fn create_session(&self, name: String, class_level: u8)
    -> BoxFuture<'static, StorageResult<String>>;
    /// Close a session with its final stats.
    fn end_session(
        &self,
        session_id: String,
        stats: SessionStatsEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Append one result to the session log.
    fn save_game_result(
        &self,
        session_id: String,
        result: GameResultEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
}

/// Persistence of teacher broadcasts.
pub trait LiveSessionStore: Send + Sync {
    /// Every live session, in creation order.
    fn get_all_live_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<LiveSessionEntity>>>;
    /// Live sessions whose status is active, in creation order.
    fn get_active_live_sessions(&self)
    -> BoxFuture<'static, StorageResult<Vec<LiveSessionEntity>>>;
    /// Start a broadcast and return its identifier.
    fn create_live_session(&self, draft: LiveSessionDraft)
    -> BoxFuture<'static, StorageResult<String>>;
    /// Mark a broadcast completed; `false` when it does not exist.
    fn end_live_session(&self, id: String) -> BoxFuture<'static, StorageResult<bool>>;
    /// Remove a broadcast; `false` when it does not exist.
    fn delete_live_session(&self, id: String) -> BoxFuture<'static, StorageResult<bool>>;
    /// Append an answer under the player's own key.
    fn update_live_session_result(
        &self,
        session_id: String,
        player_name: String,
        answer: PlayerAnswerEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
}

/// Persistence of the global settings document.
pub trait SettingsStore: Send + Sync {
    /// Read the settings, defaulting when none were saved.
    fn load_settings(&self) -> BoxFuture<'static, StorageResult<SettingsEntity>>;
    /// Replace the settings.
    fn save_settings(&self, settings: SettingsEntity) -> BoxFuture<'static, StorageResult<()>>;
}

/// A complete backend, supervised for connectivity.
pub trait RemoteStore: SessionStore + LiveSessionStore + SettingsStore {
    /// Cheap connectivity probe.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
