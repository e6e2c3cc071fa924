use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::validation::validate_not_blank,
    state::player::{MAX_NAME_CHARS, Player},
};

/// Player setup form.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SetPlayerRequest {
    /// Display name, trimmed by the console.
    #[validate(custom(function = "validate_not_blank"), length(max = 64))]
    pub name: String,
    /// Grade level; must be one of the configured grades.
    pub class_level: u8,
}

/// Player identity as shown to the presentation layer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerSummary {
    /// Display name.
    pub name: String,
    /// Grade level.
    pub class_level: u8,
    /// Remote session identifier once created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// True while the remote session is being created.
    pub session_pending: bool,
}

impl PlayerSummary {
    /// Project `player`.
    pub fn new(player: &Player, session_pending: bool) -> Self {
        Self {
            name: player.name.clone(),
            class_level: player.class_level,
            session_id: player.session_id.clone(),
            session_pending,
        }
    }
}

/// Limits a client should enforce before submitting the setup form.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerOptions {
    /// Grades accepted by this deployment.
    pub supported_grades: Vec<u8>,
    /// Maximum player name length, in characters.
    pub max_name_chars: usize,
}

impl PlayerOptions {
    /// Options for the configured grades.
    pub fn new(supported_grades: &[u8]) -> Self {
        Self {
            supported_grades: supported_grades.to_vec(),
            max_name_chars: MAX_NAME_CHARS,
        }
    }
}

/// Outcome of the unload beacon.
#[derive(Debug, Serialize, ToSchema)]
pub struct EndSessionResponse {
    /// Whether final stats reached the store.
    pub submitted: bool,
}
