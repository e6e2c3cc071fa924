//! In-process backend used when no document store is configured, and by tests.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::SystemTime,
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::{
    models::{
        GameResultEntity, LiveSessionDraft, LiveSessionEntity, LiveSessionStatus,
        PlayerAnswerEntity, SessionEntity, SessionStatsEntity, SettingsEntity,
    },
    storage::{StorageError, StorageResult},
    store::{LiveSessionStore, RemoteStore, SessionStore, SettingsStore},
};

/// Failure injected with [`MemoryStore::set_failing`].
#[derive(Debug, Error)]
#[error("memory store is switched off")]
pub struct MemoryFault;

#[derive(Default)]
struct Inner {
    sessions: DashMap<String, SessionEntity>,
    results: DashMap<String, Vec<GameResultEntity>>,
    live_sessions: DashMap<String, LiveSessionEntity>,
    settings: RwLock<SettingsEntity>,
    failing: AtomicBool,
}

/// `DashMap`-backed store living for the process lifetime.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    /// Copy of a session record.
    pub fn session(&self, id: &str) -> Option<SessionEntity> {
        self.inner.sessions.get(id).map(|entry| entry.clone())
    }

    /// Result log of a session, in arrival order.
    pub fn game_results(&self, session_id: &str) -> Vec<GameResultEntity> {
        self.inner
            .results
            .get(session_id)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }

    /// Copy of a live session record.
    pub fn live_session(&self, id: &str) -> Option<LiveSessionEntity> {
        self.inner.live_sessions.get(id).map(|entry| entry.clone())
    }

    /// Insert a live session as-is, bypassing the draft workflow.
    pub fn insert_live_session(&self, session: LiveSessionEntity) {
        self.inner.live_sessions.insert(session.id.clone(), session);
    }

    fn guard(&self, operation: &str) -> StorageResult<()> {
        if self.inner.failing.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable(
                format!("memory store refused `{operation}`"),
                MemoryFault,
            ));
        }
        Ok(())
    }

    fn sorted_live_sessions(&self) -> Vec<LiveSessionEntity> {
        let mut sessions: Vec<LiveSessionEntity> = self
            .inner
            .live_sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        sessions
    }
}

impl SessionStore for MemoryStore {
    fn create_session(
        &self,
        name: String,
        class_level: u8,
    ) -> BoxFuture<'static, StorageResult<String>> {
        let store = self.clone();
        Box::pin(async move {
            store.guard("create_session")?;
            let id = Uuid::new_v4().to_string();
            store.inner.sessions.insert(
                id.clone(),
                SessionEntity {
                    id: id.clone(),
                    player_name: name,
                    class_level,
                    started_at: SystemTime::now(),
                    ended_at: None,
                    final_stats: None,
                },
            );
            Ok(id)
        })
    }

    fn end_session(
        &self,
        session_id: String,
        stats: SessionStatsEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.guard("end_session")?;
            let mut session = store
                .inner
                .sessions
                .get_mut(&session_id)
                .ok_or_else(|| StorageError::NotFound(format!("session `{session_id}`")))?;
            session.ended_at = Some(SystemTime::now());
            session.final_stats = Some(stats);
            Ok(())
        })
    }

    fn save_game_result(
        &self,
        session_id: String,
        result: GameResultEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.guard("save_game_result")?;
            store
                .inner
                .results
                .entry(session_id)
                .or_default()
                .push(result);
            Ok(())
        })
    }
}

impl LiveSessionStore for MemoryStore {
    fn get_all_live_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<LiveSessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.guard("get_all_live_sessions")?;
            Ok(store.sorted_live_sessions())
        })
    }

    fn get_active_live_sessions(
        &self,
    ) -> BoxFuture<'static, StorageResult<Vec<LiveSessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.guard("get_active_live_sessions")?;
            Ok(store
                .sorted_live_sessions()
                .into_iter()
                .filter(|session| session.status == LiveSessionStatus::Active)
                .collect())
        })
    }

    fn create_live_session(
        &self,
        draft: LiveSessionDraft,
    ) -> BoxFuture<'static, StorageResult<String>> {
        let store = self.clone();
        Box::pin(async move {
            store.guard("create_live_session")?;
            let id = Uuid::new_v4().to_string();
            store
                .inner
                .live_sessions
                .insert(id.clone(), LiveSessionEntity::from_draft(id.clone(), draft));
            Ok(id)
        })
    }

    fn end_live_session(&self, id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store.guard("end_live_session")?;
            match store.inner.live_sessions.get_mut(&id) {
                Some(mut session) => {
                    session.complete();
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn delete_live_session(&self, id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store.guard("delete_live_session")?;
            Ok(store.inner.live_sessions.remove(&id).is_some())
        })
    }

    fn update_live_session_result(
        &self,
        session_id: String,
        player_name: String,
        answer: PlayerAnswerEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.guard("update_live_session_result")?;
            let mut session = store
                .inner
                .live_sessions
                .get_mut(&session_id)
                .ok_or_else(|| StorageError::NotFound(format!("live session `{session_id}`")))?;
            session.results.entry(player_name).or_default().push(answer);
            Ok(())
        })
    }
}

impl SettingsStore for MemoryStore {
    fn load_settings(&self) -> BoxFuture<'static, StorageResult<SettingsEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store.guard("load_settings")?;
            Ok(*store.inner.settings.read().await)
        })
    }

    fn save_settings(&self, settings: SettingsEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.guard("save_settings")?;
            *store.inner.settings.write().await = settings;
            Ok(())
        })
    }
}

impl RemoteStore for MemoryStore {
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.guard("health_check") })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.guard("try_reconnect") })
    }
}
