//! CodeQuest binary entrypoint wiring REST, SSE, the background pollers and the store supervisor.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use codequest::{
    challenges::ChallengeLibrary,
    config::AppConfig,
    dao::{
        storage::StorageError,
        store::{RemoteStore, memory::MemoryStore},
    },
    routes,
    services::{live_session_poller, player_service, settings_service, storage_supervisor},
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let library = ChallengeLibrary::load();
    info!(challenges = library.len(), "challenge library ready");

    let app_state = AppState::new(config, library);

    let supervisor = tokio::spawn(storage_supervisor::run(app_state.clone(), connect_store));
    let poller = tokio::spawn(live_session_poller::run(app_state.clone()));
    let settings = tokio::spawn(settings_service::run(app_state.clone()));
    for handle in [supervisor, poller, settings] {
        app_state.register_task(handle).await;
    }

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state.clone());

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown(app_state))
        .await
        .context("serving axum")?;

    Ok(())
}

/// Connect to CouchDB when configured, otherwise fall back to the in-process store.
async fn connect_store() -> Result<Arc<dyn RemoteStore>, StorageError> {
    #[cfg(feature = "couch-store")]
    {
        use codequest::dao::store::couchdb::{CouchConfig, CouchStore};

        if CouchConfig::is_configured() {
            let config = CouchConfig::from_env()?;
            let store = CouchStore::connect(config).await?;
            return Ok(Arc::new(store));
        }
    }

    info!("no document store configured; using the in-memory store");
    Ok(Arc::new(MemoryStore::new()))
}

/// Once a signal arrives, stop the background loops and submit the final stats
/// before axum drains the open connections.
async fn shutdown(state: SharedState) {
    shutdown_signal().await;
    info!("shutdown requested");
    state.abort_tasks().await;
    if !player_service::end_current_session(&state).await {
        warn!("final session stats were not submitted");
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
