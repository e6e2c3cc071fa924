//! Application-level configuration loading: polling cadence, grades, scoring and
//! message templates.

use std::{collections::HashMap, env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationSeconds, serde_as};
use tracing::{info, warn};

use crate::{
    challenges::DEFAULT_HISTORY_WINDOW,
    state::{catalog::Activity, catalog::GameType, session::Scoring},
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CODEQUEST_CONFIG_PATH";

/// Bounds of the live-session polling interval.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(20);
/// Upper bound of the live-session polling interval.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(25);
const DEFAULT_SETTINGS_POLL_INTERVAL: Duration = Duration::from_secs(15);
/// Upper bound on one remote message request.
pub const DEFAULT_AI_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_GRADES: [u8; 4] = [2, 3, 4, 5];

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    poll_interval: Duration,
    settings_poll_interval: Duration,
    history_window: usize,
    supported_grades: Vec<u8>,
    scoring: HashMap<GameType, Scoring>,
    default_scoring: Scoring,
    teacher_token: Option<String>,
    ai_endpoint: Option<String>,
    ai_timeout: Duration,
    message_templates: HashMap<String, String>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        poll_interval_secs = app_config.poll_interval.as_secs(),
                        grades = ?app_config.supported_grades,
                        "loaded config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a configuration document.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Interval between live-session polls, always within 20–30 seconds.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Interval between settings reads.
    pub fn settings_poll_interval(&self) -> Duration {
        self.settings_poll_interval
    }

    /// Number of recent challenges excluded from selection.
    pub fn history_window(&self) -> usize {
        self.history_window
    }

    /// Grades a player may pick.
    pub fn supported_grades(&self) -> &[u8] {
        &self.supported_grades
    }

    /// Scoring parameters of an activity; custom tests use the default.
    pub fn scoring_for(&self, activity: &Activity) -> Scoring {
        activity
            .game_type()
            .and_then(|game| self.scoring.get(&game).copied())
            .unwrap_or(self.default_scoring)
    }

    /// Shared secret expected in the `X-Teacher-Token` header.
    pub fn teacher_token(&self) -> Option<&str> {
        self.teacher_token.as_deref()
    }

    /// Endpoint of the remote message generator.
    pub fn ai_endpoint(&self) -> Option<&str> {
        self.ai_endpoint.as_deref()
    }

    /// Longest wait for a remote message before the template is used.
    pub fn ai_timeout(&self) -> Duration {
        self.ai_timeout
    }

    /// Template overrides keyed by `kind` or `kind.game_type`.
    pub fn message_templates(&self) -> &HashMap<String, String> {
        &self.message_templates
    }

    /// Replace the teacher token (used by tests and tools).
    pub fn with_teacher_token(mut self, token: impl Into<String>) -> Self {
        self.teacher_token = Some(token.into());
        self
    }

    /// Replace the scoring of one game.
    pub fn with_scoring(mut self, game: GameType, scoring: Scoring) -> Self {
        self.scoring.insert(game, scoring);
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    poll_interval_secs: Option<Duration>,
    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    settings_poll_interval_secs: Option<Duration>,
    history_window: Option<usize>,
    supported_grades: Option<Vec<u8>>,
    scoring: RawScoring,
    teacher_token: Option<String>,
    ai_endpoint: Option<String>,
    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    ai_timeout_secs: Option<Duration>,
    message_templates: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// Scoring section: a default plus per-game overrides.
struct RawScoring {
    default: Option<Scoring>,
    games: HashMap<GameType, Scoring>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let poll_interval = value
            .poll_interval_secs
            .unwrap_or(DEFAULT_POLL_INTERVAL)
            .clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL);
        let settings_poll_interval = value
            .settings_poll_interval_secs
            .filter(|interval| !interval.is_zero())
            .unwrap_or(DEFAULT_SETTINGS_POLL_INTERVAL);
        let supported_grades = value
            .supported_grades
            .filter(|grades| !grades.is_empty())
            .unwrap_or_else(|| DEFAULT_GRADES.to_vec());

        Self {
            poll_interval,
            settings_poll_interval,
            history_window: value.history_window.unwrap_or(DEFAULT_HISTORY_WINDOW),
            supported_grades,
            scoring: value.scoring.games,
            default_scoring: value.scoring.default.unwrap_or_default(),
            teacher_token: value.teacher_token.filter(|token| !token.trim().is_empty()),
            ai_endpoint: value.ai_endpoint.filter(|url| !url.trim().is_empty()),
            ai_timeout: value
                .ai_timeout_secs
                .filter(|timeout| !timeout.is_zero())
                .unwrap_or(DEFAULT_AI_TIMEOUT),
            message_templates: value.message_templates,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_empty() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(25));
        assert_eq!(config.settings_poll_interval(), Duration::from_secs(15));
        assert_eq!(config.history_window(), 5);
        assert_eq!(config.supported_grades(), &[2, 3, 4, 5]);
        assert_eq!(
            config.scoring_for(&Activity::game(GameType::Binary)),
            Scoring::default()
        );
        assert!(config.teacher_token().is_none());
        assert_eq!(config.ai_timeout(), DEFAULT_AI_TIMEOUT);
    }

    #[test]
    fn zero_ai_timeout_keeps_default() {
        let config = AppConfig::from_json(r#"{"ai_timeout_secs": 0}"#).unwrap();
        assert_eq!(config.ai_timeout(), DEFAULT_AI_TIMEOUT);
        let config = AppConfig::from_json(r#"{"ai_timeout_secs": 7}"#).unwrap();
        assert_eq!(config.ai_timeout(), Duration::from_secs(7));
    }

    #[test]
    fn poll_interval_is_clamped() {
        let fast = AppConfig::from_json(r#"{"poll_interval_secs": 2}"#).unwrap();
        assert_eq!(fast.poll_interval(), MIN_POLL_INTERVAL);
        let slow = AppConfig::from_json(r#"{"poll_interval_secs": 600}"#).unwrap();
        assert_eq!(slow.poll_interval(), MAX_POLL_INTERVAL);
    }

    #[test]
    fn per_game_scoring_overrides_default() {
        let config = AppConfig::from_json(
            r#"{
                "scoring": {
                    "default": {"base_points": 5, "streak_multiplier": 1},
                    "games": {"sorting": {"base_points": 20, "streak_multiplier": 10}}
                },
                "teacher_token": "  "
            }"#,
        )
        .unwrap();
        assert_eq!(
            config.scoring_for(&Activity::game(GameType::Sorting)).base_points,
            20
        );
        assert_eq!(
            config
                .scoring_for(&Activity::CustomTest {
                    test_id: "t".into()
                })
                .base_points,
            5
        );
        assert!(config.teacher_token().is_none());
    }
}
