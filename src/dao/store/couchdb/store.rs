use std::{sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::from_value;
use tracing::warn;
use uuid::Uuid;

use crate::dao::{
    models::{
        GameResultEntity, LiveSessionDraft, LiveSessionEntity, LiveSessionStatus,
        PlayerAnswerEntity, SessionEntity, SessionStatsEntity, SettingsEntity,
    },
    storage::{StorageError, StorageResult},
    store::{LiveSessionStore, RemoteStore, SessionStore, SettingsStore},
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsResponse, CouchLiveSessionDocument, CouchResultDocument, CouchSessionDocument,
        CouchSettingsDocument, END_SUFFIX, LIVE_PREFIX, SETTINGS_DOC_ID, WriteResponse,
        live_doc_id, session_doc_id,
    },
};

/// CouchDB-backed store speaking the HTTP document API.
#[derive(Clone)]
pub struct CouchStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, self.database, path);
        self.authorize(self.client.request(method, url))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = format!("{}/{}", self.base_url, self.database);

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorize(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                // 412: created concurrently by another client.
                if create.status().is_success()
                    || create.status() == StatusCode::PRECONDITION_FAILED
                {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    /// Write a document; a stale `_rev` surfaces as [`CouchDaoError::Conflict`].
    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<String>
    where
        T: ?Sized + Serialize,
    {
        let body = serde_json::to_value(document).map_err(|source| {
            CouchDaoError::SerializeValue {
                path: doc_id.to_string(),
                source,
            }
        })?;

        let response = self
            .request(Method::PUT, doc_id)
            .json(&body)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::CONFLICT => Err(CouchDaoError::Conflict {
                path: doc_id.to_string(),
            }),
            status if status.is_success() => response
                .json::<WriteResponse>()
                .await
                .map(|write| write.rev)
                .map_err(|source| CouchDaoError::DecodeResponse {
                    path: doc_id.to_string(),
                    source,
                }),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn delete_document(&self, doc_id: &str, rev: &str) -> CouchResult<()> {
        let response = self
            .request(Method::DELETE, doc_id)
            .query(&[("rev", rev)])
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::CONFLICT => Err(CouchDaoError::Conflict {
                path: doc_id.to_string(),
            }),
            status if status.is_success() => Ok(()),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn list_documents<T>(&self, prefix: &str) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        const ALL_DOCS: &str = "_all_docs";
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{}\"", prefix)),
            ("endkey", format!("\"{}{}\"", prefix, END_SUFFIX)),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        let mut documents = Vec::new();
        for row in payload.rows {
            if let Some(doc) = row.doc {
                let parsed = from_value(doc).map_err(|source| CouchDaoError::DeserializeValue {
                    path: row.id.clone(),
                    source,
                })?;
                documents.push(parsed);
            }
        }

        Ok(documents)
    }

    async fn live_sessions(&self) -> CouchResult<Vec<LiveSessionEntity>> {
        let docs = self
            .list_documents::<CouchLiveSessionDocument>(LIVE_PREFIX)
            .await?;
        let mut sessions = docs
            .into_iter()
            .map(LiveSessionEntity::try_from)
            .collect::<CouchResult<Vec<_>>>()?;
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(sessions)
    }

    async fn live_document(&self, id: &str) -> CouchResult<Option<CouchLiveSessionDocument>> {
        self.get_document::<CouchLiveSessionDocument>(&live_doc_id(id))
            .await
    }
}

/// Concurrent writers are not retried; the conflict is logged and reported.
fn log_conflict(err: CouchDaoError) -> StorageError {
    if let CouchDaoError::Conflict { ref path } = err {
        warn!(path = %path, "CouchDB revision conflict, write dropped");
    }
    err.into()
}

impl SessionStore for CouchStore {
    fn create_session(
        &self,
        name: String,
        class_level: u8,
    ) -> BoxFuture<'static, StorageResult<String>> {
        let store = self.clone();
        Box::pin(async move {
            let id = Uuid::new_v4().to_string();
            let doc = CouchSessionDocument::from(SessionEntity {
                id: id.clone(),
                player_name: name,
                class_level,
                started_at: SystemTime::now(),
                ended_at: None,
                final_stats: None,
            });
            store.put_document(&doc.id, &doc).await?;
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
            let doc_id = session_doc_id(&session_id);
            let mut doc = store
                .get_document::<CouchSessionDocument>(&doc_id)
                .await?
                .ok_or_else(|| StorageError::NotFound(format!("session `{session_id}`")))?;
            doc.ended_at = Some(SystemTime::now());
            doc.final_stats = Some(stats);
            store
                .put_document(&doc_id, &doc)
                .await
                .map(|_| ())
                .map_err(log_conflict)
        })
    }

    fn save_game_result(
        &self,
        session_id: String,
        result: GameResultEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let doc = CouchResultDocument::new(session_id, result);
            store
                .put_document(&doc.id, &doc)
                .await
                .map(|_| ())
                .map_err(Into::into)
        })
    }
}

impl LiveSessionStore for CouchStore {
    fn get_all_live_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<LiveSessionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.live_sessions().await.map_err(Into::into) })
    }

    fn get_active_live_sessions(
        &self,
    ) -> BoxFuture<'static, StorageResult<Vec<LiveSessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let sessions = store.live_sessions().await?;
            Ok(sessions
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
            let id = Uuid::new_v4().to_string();
            let doc = CouchLiveSessionDocument::from(LiveSessionEntity::from_draft(
                id.clone(),
                draft,
            ));
            store.put_document(&doc.id, &doc).await?;
            Ok(id)
        })
    }

    fn end_live_session(&self, id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let Some(doc) = store.live_document(&id).await? else {
                return Ok(false);
            };
            let rev = doc.rev.clone();
            let mut entity = LiveSessionEntity::try_from(doc)?;
            entity.complete();
            let mut doc = CouchLiveSessionDocument::from(entity);
            doc.rev = rev;
            store
                .put_document(&doc.id, &doc)
                .await
                .map_err(log_conflict)?;
            Ok(true)
        })
    }

    fn delete_live_session(&self, id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let Some(doc) = store.live_document(&id).await? else {
                return Ok(false);
            };
            let Some(rev) = doc.rev else {
                return Err(CouchDaoError::InvalidDocId {
                    doc_id: doc.id,
                    kind: "missing revision",
                }
                .into());
            };
            store
                .delete_document(&doc.id, &rev)
                .await
                .map_err(log_conflict)?;
            Ok(true)
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
            let mut doc = store
                .live_document(&session_id)
                .await?
                .ok_or_else(|| StorageError::NotFound(format!("live session `{session_id}`")))?;
            doc.live
                .results
                .entry(player_name)
                .or_default()
                .push(answer);
            store
                .put_document(&doc.id, &doc)
                .await
                .map(|_| ())
                .map_err(log_conflict)
        })
    }
}

impl SettingsStore for CouchStore {
    fn load_settings(&self) -> BoxFuture<'static, StorageResult<SettingsEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let doc = store
                .get_document::<CouchSettingsDocument>(SETTINGS_DOC_ID)
                .await?;
            Ok(doc.map(|doc| doc.settings).unwrap_or_default())
        })
    }

    fn save_settings(&self, settings: SettingsEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let rev = store
                .get_document::<CouchSettingsDocument>(SETTINGS_DOC_ID)
                .await?
                .and_then(|existing| existing.rev);
            let doc = CouchSettingsDocument {
                id: SETTINGS_DOC_ID.to_string(),
                rev,
                settings,
            };
            store
                .put_document(SETTINGS_DOC_ID, &doc)
                .await
                .map(|_| ())
                .map_err(log_conflict)
        })
    }
}

impl RemoteStore for CouchStore {
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = format!("{}/{}", store.base_url, store.database);
            let response = store
                .authorize(store.client.get(&url))
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: url.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
