//! Library crate for codequest, exposing modules for binaries and integration tests.

/// Challenge library and selection.
pub mod challenges;
/// Runtime configuration.
pub mod config;
/// Persistence models and stores.
pub mod dao;
/// HTTP and SSE payloads.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// Axum router.
pub mod routes;
/// Application services and background loops.
pub mod services;
/// Shared state and the player console.
pub mod state;
