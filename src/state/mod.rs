/// Badge thresholds and evaluation.
pub mod achievements;
/// Games and activities offered by the console.
pub mod catalog;
/// The player console owning all per-player state.
pub mod console;
/// Player identity and remote session ticket.
pub mod player;
/// Score, streak and outcome bookkeeping.
pub mod session;
mod sse;
/// Menu navigation state machine.
pub mod state_machine;

use std::sync::Arc;

use tokio::{
    sync::{Mutex, Notify, RwLock, watch},
    task::JoinHandle,
};

use crate::{
    challenges::ChallengeLibrary,
    config::AppConfig,
    dao::store::RemoteStore,
    error::ServiceError,
    services::message_service::MessageService,
};

pub use self::console::PlayerConsole;
pub use self::sse::SseHub;

/// Application state shared by handlers and background tasks.
pub type SharedState = Arc<AppState>;

/// Capacity of the player SSE channel.
const SSE_CAPACITY: usize = 32;

/// Central application state: the player console, the storage handle and the
/// channels feeding the presentation layer.
pub struct AppState {
    config: AppConfig,
    store: RwLock<Option<Arc<dyn RemoteStore>>>,
    degraded: watch::Sender<bool>,
    console: RwLock<PlayerConsole>,
    sse: SseHub,
    ai_messages: watch::Sender<bool>,
    messages: MessageService,
    poll_trigger: Notify,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, library: ChallengeLibrary) -> SharedState {
        let messages = MessageService::from_config(&config);
        Self::with_messages(config, library, messages)
    }

    /// Same as [`AppState::new`] with an explicit message service.
    pub fn with_messages(
        config: AppConfig,
        library: ChallengeLibrary,
        messages: MessageService,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let (ai_messages_tx, _rx) = watch::channel(false);
        let console = PlayerConsole::new(Arc::new(library), config.history_window());
        Arc::new(Self {
            config,
            store: RwLock::new(None),
            degraded: degraded_tx,
            console: RwLock::new(console),
            sse: SseHub::new(SSE_CAPACITY),
            ai_messages: ai_messages_tx,
            messages,
            poll_trigger: Notify::new(),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn RemoteStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Current store, or [`ServiceError::Degraded`] while none is usable.
    pub async fn require_store(&self) -> Result<Arc<dyn RemoteStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn set_store(&self, store: Arc<dyn RemoteStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }

    /// The single player console owned by this process.
    pub fn console(&self) -> &RwLock<PlayerConsole> {
        &self.console
    }

    /// Broadcast hub used for the player SSE stream.
    pub fn sse(&self) -> &SseHub {
        &self.sse
    }

    /// Latest `aiMessagesEnabled` value delivered by the settings feed.
    pub fn ai_messages_enabled(&self) -> bool {
        *self.ai_messages.borrow()
    }

    /// Subscribe to settings changes; only changed values are delivered.
    pub fn settings_watcher(&self) -> watch::Receiver<bool> {
        self.ai_messages.subscribe()
    }

    /// Publish a settings value; returns whether it changed.
    pub fn publish_ai_messages(&self, enabled: bool) -> bool {
        self.ai_messages.send_if_modified(|current| {
            let changed = *current != enabled;
            *current = enabled;
            changed
        })
    }

    /// Encouragement message lookup.
    pub fn messages(&self) -> &MessageService {
        &self.messages
    }

    /// Wakes the live-session poller ahead of its next tick.
    pub fn poll_trigger(&self) -> &Notify {
        &self.poll_trigger
    }

    /// Ask the poller to run now.
    pub fn request_poll(&self) {
        self.poll_trigger.notify_one();
    }

    /// Keep a background task so teardown can cancel it.
    pub async fn register_task(&self, handle: JoinHandle<()>) {
        self.tasks.lock().await.push(handle);
    }

    /// Abort every registered background task.
    pub async fn abort_tasks(&self) {
        let handles = std::mem::take(&mut *self.tasks.lock().await);
        for handle in handles {
            handle.abort();
        }
    }
}
