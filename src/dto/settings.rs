use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dao::models::SettingsEntity;

/// Global settings as read and written by the teacher.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct SettingsDto {
    /// Whether encouragement messages may be generated remotely.
    pub ai_messages_enabled: bool,
}

impl From<SettingsEntity> for SettingsDto {
    fn from(value: SettingsEntity) -> Self {
        Self {
            ai_messages_enabled: value.ai_messages_enabled,
        }
    }
}

impl From<SettingsDto> for SettingsEntity {
    fn from(value: SettingsDto) -> Self {
        Self {
            ai_messages_enabled: value.ai_messages_enabled,
        }
    }
}
