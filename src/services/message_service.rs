//! Encouragement messages: optional remote generation with a deterministic
//! local template table as fallback.

use std::{collections::HashMap, sync::Arc, time::Duration};

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::{
    config::{AppConfig, DEFAULT_AI_TIMEOUT},
    state::catalog::GameType,
};

/// Streak values that trigger a streak message.
pub const STREAK_MILESTONES: [u32; 3] = [3, 5, 10];

/// Situation a message is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Player just set up.
    Welcome,
    /// Correct answer.
    Correct,
    /// Streak milestone reached.
    Streak,
    /// Incorrect answer.
    Wrong,
    /// Badge unlocked.
    Achievement,
    /// Player asked for a hint.
    Help,
}

impl MessageKind {
    /// Template key of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Welcome => "welcome",
            MessageKind::Correct => "correct",
            MessageKind::Streak => "streak",
            MessageKind::Wrong => "wrong",
            MessageKind::Achievement => "achievement",
            MessageKind::Help => "help",
        }
    }
}

/// Facts a message may mention.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MessageContext {
    /// Player name.
    pub name: String,
    /// Game being played, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_type: Option<GameType>,
    /// Current streak.
    pub streak: u32,
    /// Current total score.
    pub score: u32,
    /// Title of the badge just unlocked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievement: Option<String>,
}

/// Message handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PersonalizedMessage {
    /// Situation the message answers.
    pub kind: MessageKind,
    /// Text to display.
    pub message: String,
    /// Whether the text came from the remote cache.
    pub cached: bool,
}

/// Failures of a remote message provider. Never surfaced to the player.
#[derive(Debug, Error)]
pub enum MessageError {
    /// Request could not be sent or decoded.
    #[cfg(feature = "ai-messages")]
    #[error("message request failed")]
    Request(#[source] reqwest::Error),
    /// Provider answered with an error status.
    #[error("message provider returned status {0}")]
    Status(u16),
    /// Provider answered with an empty text.
    #[error("message provider returned an empty message")]
    Empty,
    /// Provider did not answer in time.
    #[error("message provider timed out after {0:?}")]
    Timeout(Duration),
}

/// Remote generator of personalised messages.
pub trait MessageProvider: Send + Sync {
    /// Produce a message for `kind` in `context`.
    fn generate(
        &self,
        kind: MessageKind,
        context: &MessageContext,
    ) -> BoxFuture<'static, Result<String, MessageError>>;
}

#[cfg(feature = "ai-messages")]
pub use self::http::HttpMessageProvider;

#[cfg(feature = "ai-messages")]
mod http {
    use std::{sync::Arc, time::Duration};

    use futures::future::BoxFuture;
    use reqwest::Client;
    use serde::{Deserialize, Serialize};

    use super::{MessageContext, MessageError, MessageKind, MessageProvider};

    #[derive(Serialize)]
    struct GenerateRequest<'a> {
        #[serde(rename = "type")]
        kind: MessageKind,
        context: &'a MessageContext,
    }

    #[derive(Deserialize)]
    struct GenerateResponse {
        message: String,
    }

    /// Provider POSTing `{type, context}` to a configured endpoint.
    #[derive(Clone)]
    pub struct HttpMessageProvider {
        client: Client,
        endpoint: Arc<str>,
    }

    impl HttpMessageProvider {
        /// Provider targeting `endpoint`; each request is abandoned after `timeout`.
        pub fn new(endpoint: impl Into<Arc<str>>, timeout: Duration) -> Result<Self, MessageError> {
            let client = Client::builder()
                .timeout(timeout)
                .build()
                .map_err(MessageError::Request)?;
            Ok(Self {
                client,
                endpoint: endpoint.into(),
            })
        }
    }

    impl MessageProvider for HttpMessageProvider {
        fn generate(
            &self,
            kind: MessageKind,
            context: &MessageContext,
        ) -> BoxFuture<'static, Result<String, MessageError>> {
            let request = self
                .client
                .post(self.endpoint.as_ref())
                .json(&GenerateRequest { kind, context });
            Box::pin(async move {
                let response = request.send().await.map_err(MessageError::Request)?;
                if !response.status().is_success() {
                    return Err(MessageError::Status(response.status().as_u16()));
                }
                let body = response
                    .json::<GenerateResponse>()
                    .await
                    .map_err(MessageError::Request)?;
                let message = body.message.trim().to_string();
                if message.is_empty() {
                    return Err(MessageError::Empty);
                }
                Ok(message)
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    kind: MessageKind,
    game_type: Option<GameType>,
    name: String,
    streak_bucket: u32,
}

impl CacheKey {
    fn new(kind: MessageKind, context: &MessageContext) -> Self {
        Self {
            kind,
            game_type: context.game_type,
            name: context.name.clone(),
            streak_bucket: streak_bucket(context.streak),
        }
    }
}

/// Message lookup combining the remote provider, its cache and the templates.
pub struct MessageService {
    provider: Option<Arc<dyn MessageProvider>>,
    templates: HashMap<String, String>,
    cache: DashMap<CacheKey, String>,
    timeout: Duration,
}

impl MessageService {
    /// Service using `provider` when enabled; `overrides` replace built-in templates.
    pub fn new(
        provider: Option<Arc<dyn MessageProvider>>,
        overrides: &HashMap<String, String>,
    ) -> Self {
        let mut templates: HashMap<String, String> = BUILTIN_TEMPLATES
            .iter()
            .map(|(key, text)| (key.to_string(), text.to_string()))
            .collect();
        templates.extend(
            overrides
                .iter()
                .map(|(key, text)| (key.clone(), text.clone())),
        );

        Self {
            provider,
            templates,
            cache: DashMap::new(),
            timeout: DEFAULT_AI_TIMEOUT,
        }
    }

    /// Bound the wait for a remote message.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Service built from the application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(remote_provider(config), config.message_templates())
            .with_timeout(config.ai_timeout())
    }

    /// Message for `kind`, generated remotely when `ai_enabled` and a provider
    /// exists, otherwise (or on failure) rendered from the templates.
    pub async fn personalized(
        &self,
        kind: MessageKind,
        context: &MessageContext,
        ai_enabled: bool,
    ) -> PersonalizedMessage {
        let Some(provider) = self.provider.as_ref().filter(|_| ai_enabled) else {
            return self.fallback(kind, context);
        };

        let key = CacheKey::new(kind, context);
        if let Some(hit) = self.cache.get(&key) {
            return PersonalizedMessage {
                kind,
                message: hit.clone(),
                cached: true,
            };
        }

        let generated = tokio::time::timeout(self.timeout, provider.generate(kind, context))
            .await
            .unwrap_or(Err(MessageError::Timeout(self.timeout)));

        match generated {
            Ok(message) => {
                self.cache.insert(key, message.clone());
                PersonalizedMessage {
                    kind,
                    message,
                    cached: false,
                }
            }
            Err(err) => {
                warn!(kind = kind.as_str(), error = %err, "message provider failed; using template");
                self.fallback(kind, context)
            }
        }
    }

    /// Deterministic templated message.
    pub fn fallback(&self, kind: MessageKind, context: &MessageContext) -> PersonalizedMessage {
        let specific = context
            .game_type
            .and_then(|game| self.templates.get(&format!("{}.{}", kind.as_str(), game)));
        let template = specific
            .or_else(|| self.templates.get(kind.as_str()))
            .map(String::as_str)
            .unwrap_or("{name}!");

        PersonalizedMessage {
            kind,
            message: render(template, context),
            cached: false,
        }
    }
}

#[cfg(feature = "ai-messages")]
fn remote_provider(config: &AppConfig) -> Option<Arc<dyn MessageProvider>> {
    let endpoint = config.ai_endpoint()?;
    match HttpMessageProvider::new(endpoint, config.ai_timeout()) {
        Ok(provider) => {
            debug!(endpoint, "remote message provider configured");
            Some(Arc::new(provider) as Arc<dyn MessageProvider>)
        }
        Err(err) => {
            warn!(error = %err, "failed to build message client; using templates only");
            None
        }
    }
}

#[cfg(not(feature = "ai-messages"))]
fn remote_provider(config: &AppConfig) -> Option<Arc<dyn MessageProvider>> {
    if config.ai_endpoint().is_some() {
        debug!("ai_endpoint ignored: built without the `ai-messages` feature");
    }
    None
}

/// Whether a streak message is due for `streak`.
pub fn is_streak_milestone(streak: u32) -> bool {
    STREAK_MILESTONES.contains(&streak)
}

fn streak_bucket(streak: u32) -> u32 {
    STREAK_MILESTONES
        .iter()
        .rev()
        .copied()
        .find(|milestone| streak >= *milestone)
        .unwrap_or(0)
}

fn render(template: &str, context: &MessageContext) -> String {
    template
        .replace("{name}", &context.name)
        .replace("{streak}", &context.streak.to_string())
        .replace("{score}", &context.score.to_string())
}

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("welcome", "Hi {name}! Pick a game and let's learn together."),
    ("correct", "Great job, {name}! You have {score} points."),
    ("correct.binary", "Beep boop! {name} speaks binary. {score} points!"),
    ("correct.sorting", "Neatly sorted, {name}! {score} points."),
    ("streak", "{streak} in a row, {name}! Keep going!"),
    ("wrong", "Not quite, {name}. Try again, you can do it!"),
    ("wrong.algorithms", "Check each step again, {name}. Algorithms love order."),
    ("achievement", "New badge for {name}! Total score: {score}."),
    ("help", "Read the question slowly, {name}, and look at the example."),
    ("help.binary", "Each place doubles: 1, 2, 4, 8. Add the places that hold a 1."),
    ("help.flowchart", "Follow the arrows from the start, one box at a time."),
    ("help.patterns", "Look at what changes between neighbours, then repeat it."),
];

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl MessageProvider for CountingProvider {
        fn generate(
            &self,
            kind: MessageKind,
            context: &MessageContext,
        ) -> BoxFuture<'static, Result<String, MessageError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail;
            let text = format!("{} for {}", kind.as_str(), context.name);
            Box::pin(async move {
                if fail {
                    Err(MessageError::Status(503))
                } else {
                    Ok(text)
                }
            })
        }
    }

    struct SilentProvider;

    impl MessageProvider for SilentProvider {
        fn generate(
            &self,
            _kind: MessageKind,
            _context: &MessageContext,
        ) -> BoxFuture<'static, Result<String, MessageError>> {
            Box::pin(futures::future::pending())
        }
    }

    fn context(streak: u32) -> MessageContext {
        MessageContext {
            name: "Олена".into(),
            game_type: Some(GameType::Binary),
            streak,
            score: 90,
            achievement: None,
        }
    }

    fn service(fail: bool) -> (MessageService, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            calls: calls.clone(),
            fail,
        };
        (
            MessageService::new(Some(Arc::new(provider)), &HashMap::new()),
            calls,
        )
    }

    #[test]
    fn game_specific_template_wins() {
        let messages = MessageService::new(None, &HashMap::new());
        let text = messages.fallback(MessageKind::Correct, &context(1)).message;
        assert_eq!(text, "Beep boop! Олена speaks binary. 90 points!");

        let generic = MessageContext {
            game_type: Some(GameType::Words),
            ..context(3)
        };
        assert_eq!(
            messages.fallback(MessageKind::Streak, &generic).message,
            "3 in a row, Олена! Keep going!"
        );
    }

    #[test]
    fn overrides_replace_builtin_templates() {
        let overrides = HashMap::from([("wrong".to_string(), "Oops {name}".to_string())]);
        let messages = MessageService::new(None, &overrides);
        let text = messages
            .fallback(
                MessageKind::Wrong,
                &MessageContext {
                    game_type: None,
                    ..context(0)
                },
            )
            .message;
        assert_eq!(text, "Oops Олена");
    }

    #[tokio::test]
    async fn remote_messages_are_cached_per_bucket() {
        let (messages, calls) = service(false);
        let first = messages.personalized(MessageKind::Streak, &context(5), true).await;
        let second = messages.personalized(MessageKind::Streak, &context(7), true).await;
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.message, second.message);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        messages.personalized(MessageKind::Streak, &context(10), true).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn disabled_or_failing_provider_falls_back() {
        let (messages, calls) = service(true);
        let disabled = messages.personalized(MessageKind::Help, &context(0), false).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(disabled.message.starts_with("Each place doubles"));

        let failed = messages.personalized(MessageKind::Help, &context(0), true).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(failed, disabled);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_provider_times_out_to_template() {
        let messages = MessageService::new(Some(Arc::new(SilentProvider)), &HashMap::new())
            .with_timeout(Duration::from_millis(200));

        let started = tokio::time::Instant::now();
        let message = messages.personalized(MessageKind::Correct, &context(1), true).await;

        assert_eq!(message, messages.fallback(MessageKind::Correct, &context(1)));
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn streak_milestones() {
        assert!(is_streak_milestone(3));
        assert!(!is_streak_milestone(4));
        assert_eq!(streak_bucket(2), 0);
        assert_eq!(streak_bucket(9), 5);
        assert_eq!(streak_bucket(42), 10);
    }
}
