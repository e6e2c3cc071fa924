use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::GamePhase;

/// Navigation phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisiblePhase {
    /// Menu.
    Idle,
    /// Waiting for the player to pick a category.
    CategorySelecting,
    /// A game or test is running.
    Active,
}

impl From<&GamePhase> for VisiblePhase {
    fn from(value: &GamePhase) -> Self {
        match value {
            GamePhase::Idle => VisiblePhase::Idle,
            GamePhase::CategorySelecting(_) => VisiblePhase::CategorySelecting,
            GamePhase::Active(_) => VisiblePhase::Active,
        }
    }
}
