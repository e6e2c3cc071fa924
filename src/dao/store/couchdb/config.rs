use std::env;

use super::error::{CouchDaoError, CouchResult};

/// Database used when `COUCH_DB` is not set.
const DEFAULT_DATABASE: &str = "codequest";

/// Runtime configuration describing how to reach CouchDB.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server URL without a trailing slash, e.g. `http://localhost:5984`.
    pub base_url: String,
    /// Database holding every document.
    pub database: String,
    /// Basic-auth user.
    pub username: Option<String>,
    /// Basic-auth password.
    pub password: Option<String>,
}

impl CouchConfig {
    /// Construct a configuration from explicit base URL and database name.
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            database: database.into(),
            username: None,
            password: None,
        }
    }

    /// Attach basic-auth credentials to the configuration.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Whether the environment selects CouchDB as the backend.
    pub fn is_configured() -> bool {
        env::var("COUCH_BASE_URL")
            .map(|value| !value.trim().is_empty())
            .unwrap_or(false)
    }

    /// Build a configuration from `COUCH_BASE_URL`, `COUCH_DB` and the optional
    /// `COUCH_USERNAME`/`COUCH_PASSWORD` pair.
    pub fn from_env() -> CouchResult<Self> {
        let base_url = env::var("COUCH_BASE_URL").map_err(|_| CouchDaoError::MissingEnvVar {
            var: "COUCH_BASE_URL",
        })?;
        let database = env::var("COUCH_DB")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let mut config = Self::new(base_url, database);

        if let (Some(username), Some(password)) = (
            env::var("COUCH_USERNAME").ok(),
            env::var("COUCH_PASSWORD").ok(),
        ) {
            config = config.with_credentials(username, password);
        }

        Ok(config)
    }
}
