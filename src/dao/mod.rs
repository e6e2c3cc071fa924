/// Persisted record definitions.
pub mod models;
/// Storage abstraction layer shared by every backend.
pub mod storage;
/// Store capabilities and their backends.
pub mod store;
