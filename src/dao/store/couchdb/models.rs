use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    dao::models::{
        GameResultEntity, LiveSessionEntity, LiveSessionStatus, PlayerAnswerEntity,
        SessionEntity, SessionStatsEntity, SettingsEntity,
    },
    state::catalog::Activity,
};

use super::error::CouchDaoError;

pub const SESSION_PREFIX: &str = "session::";
pub const RESULT_PREFIX: &str = "result::";
pub const LIVE_PREFIX: &str = "live::";
pub const SETTINGS_DOC_ID: &str = "settings::global";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Response body of a successful document write.
#[derive(Debug, Deserialize)]
pub struct WriteResponse {
    pub rev: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchSessionDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub player_name: String,
    pub class_level: u8,
    pub started_at: SystemTime,
    #[serde(default)]
    pub ended_at: Option<SystemTime>,
    #[serde(default)]
    pub final_stats: Option<SessionStatsEntity>,
}

impl From<SessionEntity> for CouchSessionDocument {
    fn from(session: SessionEntity) -> Self {
        Self {
            id: session_doc_id(&session.id),
            rev: None,
            player_name: session.player_name,
            class_level: session.class_level,
            started_at: session.started_at,
            ended_at: session.ended_at,
            final_stats: session.final_stats,
        }
    }
}

/// One result per document keeps the log append-only and conflict-free.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchResultDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub session_id: String,
    #[serde(flatten)]
    pub result: GameResultEntity,
}

impl CouchResultDocument {
    pub fn new(session_id: String, result: GameResultEntity) -> Self {
        Self {
            id: result_doc_id(&session_id, &result.id),
            session_id,
            result,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchLiveSessionDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub live: LiveSessionBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveSessionBody {
    pub title: String,
    pub activity: Activity,
    pub player_class: u8,
    pub participants: Vec<String>,
    pub status: LiveSessionStatus,
    pub created_at: SystemTime,
    #[serde(default)]
    pub ended_at: Option<SystemTime>,
    #[serde(default)]
    pub results: IndexMap<String, Vec<PlayerAnswerEntity>>,
}

impl From<LiveSessionEntity> for CouchLiveSessionDocument {
    fn from(session: LiveSessionEntity) -> Self {
        Self {
            id: live_doc_id(&session.id),
            rev: None,
            live: LiveSessionBody {
                title: session.title,
                activity: session.activity,
                player_class: session.player_class,
                participants: session.participants,
                status: session.status,
                created_at: session.created_at,
                ended_at: session.ended_at,
                results: session.results,
            },
        }
    }
}

impl TryFrom<CouchLiveSessionDocument> for LiveSessionEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchLiveSessionDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: strip_prefix(&doc.id, LIVE_PREFIX)?,
            title: doc.live.title,
            activity: doc.live.activity,
            player_class: doc.live.player_class,
            participants: doc.live.participants,
            status: doc.live.status,
            created_at: doc.live.created_at,
            ended_at: doc.live.ended_at,
            results: doc.live.results,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchSettingsDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub settings: SettingsEntity,
}

pub fn session_doc_id(id: &str) -> String {
    format!("{}{}", SESSION_PREFIX, id)
}

pub fn result_doc_id(session_id: &str, result_id: &str) -> String {
    format!("{}{}:{}", RESULT_PREFIX, session_id, result_id)
}

pub fn live_doc_id(id: &str) -> String {
    format!("{}{}", LIVE_PREFIX, id)
}

pub fn strip_prefix(doc_id: &str, prefix: &str) -> Result<String, CouchDaoError> {
    doc_id
        .strip_prefix(prefix)
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
        .ok_or_else(|| CouchDaoError::InvalidDocId {
            doc_id: doc_id.to_string(),
            kind: "unexpected prefix",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::catalog::GameType;

    #[test]
    fn live_document_round_trips_identifier() {
        let entity = LiveSessionEntity::from_draft(
            "abc".into(),
            crate::dao::models::LiveSessionDraft {
                title: "Binary warm-up".into(),
                activity: Activity::game(GameType::Binary),
                player_class: 2,
                participants: vec!["all".into()],
            },
        );
        let doc: CouchLiveSessionDocument = entity.clone().into();
        assert_eq!(doc.id, "live::abc");

        let back = LiveSessionEntity::try_from(doc).unwrap();
        assert_eq!(back, entity);
    }

    #[test]
    fn rejects_foreign_document_ids() {
        assert!(strip_prefix("session::x", LIVE_PREFIX).is_err());
        assert!(strip_prefix("live::", LIVE_PREFIX).is_err());
        assert_eq!(strip_prefix("live::x", LIVE_PREFIX).unwrap(), "x");
    }

    #[test]
    fn result_document_flattens_the_entity() {
        let doc = CouchResultDocument::new(
            "s1".into(),
            GameResultEntity {
                id: "r1".into(),
                game_type: "binary".into(),
                points: 10,
                score: 10,
                streak: 1,
                correct: true,
                question: None,
                details: Default::default(),
                recorded_at: SystemTime::UNIX_EPOCH,
            },
        );
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["_id"], "result::s1:r1");
        assert_eq!(value["points"], 10);
        assert_eq!(value["session_id"], "s1");
    }
}
