use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{
    dto::game::{
        AchievementSummary, AnswerRequest, AnswerResponse, ConsoleSnapshot, GameCatalogEntry,
    },
    error::ServiceError,
    services::{
        message_service::{MessageContext, MessageKind, PersonalizedMessage, is_streak_milestone},
        score_sync::{self, ScoreUpdate},
        sse_events,
    },
    state::{
        SharedState,
        catalog::GameType,
        console::{ConsoleError, PlayerConsole},
        session::OutcomeReport,
    },
};

/// Current console props.
pub async fn snapshot(state: &SharedState) -> ConsoleSnapshot {
    let console = state.console().read().await;
    ConsoleSnapshot::capture(&console, state.is_degraded())
}

/// Menu entries, one per built-in game.
pub async fn catalog(state: &SharedState) -> Vec<GameCatalogEntry> {
    let console = state.console().read().await;
    let library = console.library();
    GameType::ALL
        .into_iter()
        .map(|game_type| GameCatalogEntry {
            game_type,
            category_partitioned: game_type.is_category_partitioned(),
            categories: library.categories(game_type),
            challenge_count: library.for_game(game_type).len(),
        })
        .collect()
}

/// Pick a game from the menu.
pub async fn start_game(
    state: &SharedState,
    game_type: GameType,
) -> Result<ConsoleSnapshot, ServiceError> {
    let snapshot = {
        let mut console = state.console().write().await;
        console.start_game(game_type)?;
        ConsoleSnapshot::capture(&console, state.is_degraded())
    };
    info!(game = %game_type, "game started");
    sse_events::broadcast_console(state).await;
    Ok(snapshot)
}

/// Pick the category of the pending game.
pub async fn select_category(
    state: &SharedState,
    category: &str,
) -> Result<ConsoleSnapshot, ServiceError> {
    let snapshot = {
        let mut console = state.console().write().await;
        console.select_category(category.trim())?;
        ConsoleSnapshot::capture(&console, state.is_degraded())
    };
    sse_events::broadcast_console(state).await;
    Ok(snapshot)
}

/// Leave the running game; scores are kept.
pub async fn back_to_menu(state: &SharedState) -> ConsoleSnapshot {
    let snapshot = {
        let mut console = state.console().write().await;
        console.back_to_menu();
        ConsoleSnapshot::capture(&console, state.is_degraded())
    };
    sse_events::broadcast_console(state).await;
    snapshot
}

/// Record an answer, mirror it remotely and gather the encouragement messages.
pub async fn answer(
    state: &SharedState,
    request: AnswerRequest,
) -> Result<AnswerResponse, ServiceError> {
    let (outcome, context) = {
        let mut console = state.console().write().await;
        let scoring = console
            .current_game()
            .map(|activity| state.config().scoring_for(&activity))
            .unwrap_or_default();
        let outcome = console.answer(request.correct, scoring)?;
        let context = message_context(&console).ok_or(ConsoleError::NoPlayer)?;
        (outcome, context)
    };

    let report = outcome.report.clone();
    debug!(
        activity = outcome.activity.label(),
        correct = report.correct,
        points = report.points,
        total = report.total_score,
        "answer recorded"
    );

    let question = request.question.or_else(|| {
        outcome
            .answered
            .as_ref()
            .map(|challenge| challenge.prompt.clone())
    });
    // Handles are dropped: the writes run detached.
    score_sync::propagate(
        state,
        outcome.sync,
        ScoreUpdate {
            activity: outcome.activity,
            report: report.clone(),
            question,
            details: request.details,
        },
    )
    .await;

    sse_events::broadcast_achievements(state, &report.unlocked, report.total_score);
    sse_events::broadcast_console(state).await;

    let messages = outcome_messages(state, &report, &context).await;

    Ok(AnswerResponse {
        correct: report.correct,
        points: report.points,
        total_score: report.total_score,
        streak: report.streak,
        max_streak: report.max_streak,
        unlocked: report
            .unlocked
            .iter()
            .copied()
            .map(AchievementSummary::from)
            .collect(),
        explanation: outcome.answered.map(|challenge| challenge.explanation),
        next_challenge: outcome.next,
        messages,
    })
}

/// Hint for the running game.
pub async fn help(state: &SharedState) -> Result<PersonalizedMessage, ServiceError> {
    let context = {
        let console = state.console().read().await;
        message_context(&console).ok_or(ConsoleError::NoPlayer)?
    };
    let message = state
        .messages()
        .personalized(MessageKind::Help, &context, state.ai_messages_enabled())
        .await;
    sse_events::broadcast_message(state, &message);
    Ok(message)
}

/// Generate and broadcast one message in the background.
pub async fn announce(state: &SharedState, kind: MessageKind) -> Option<JoinHandle<()>> {
    let context = {
        let console = state.console().read().await;
        message_context(&console)?
    };
    let state = state.clone();
    Some(tokio::spawn(async move {
        let message = state
            .messages()
            .personalized(kind, &context, state.ai_messages_enabled())
            .await;
        sse_events::broadcast_message(&state, &message);
    }))
}

async fn outcome_messages(
    state: &SharedState,
    report: &OutcomeReport,
    context: &MessageContext,
) -> Vec<PersonalizedMessage> {
    let mut requests = Vec::new();
    if report.correct {
        requests.push((MessageKind::Correct, context.clone()));
        if is_streak_milestone(report.streak) {
            requests.push((MessageKind::Streak, context.clone()));
        }
    } else {
        requests.push((MessageKind::Wrong, context.clone()));
    }
    for achievement in &report.unlocked {
        requests.push((
            MessageKind::Achievement,
            MessageContext {
                achievement: Some(achievement.title().to_string()),
                ..context.clone()
            },
        ));
    }

    let ai_enabled = state.ai_messages_enabled();
    let messages = join_all(requests.iter().map(|(kind, context)| {
        state.messages().personalized(*kind, context, ai_enabled)
    }))
    .await;

    for message in &messages {
        sse_events::broadcast_message(state, message);
    }
    messages
}

fn message_context(console: &PlayerConsole) -> Option<MessageContext> {
    let player = console.player()?;
    let scores = console.scores();
    Some(MessageContext {
        name: player.name.clone(),
        game_type: console
            .current_game()
            .and_then(|activity| activity.game_type()),
        streak: scores.streak(),
        score: scores.total_score(),
        achievement: None,
    })
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc, time::Duration};

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        challenges::ChallengeLibrary,
        config::AppConfig,
        services::message_service::{MessageError, MessageProvider, MessageService},
        state::{AppState, achievements::Achievement, session::Scoring},
    };

    struct StalledProvider;

    impl MessageProvider for StalledProvider {
        fn generate(
            &self,
            _kind: MessageKind,
            _context: &MessageContext,
        ) -> BoxFuture<'static, Result<String, MessageError>> {
            Box::pin(futures::future::pending())
        }
    }

    fn answer_request(correct: bool) -> AnswerRequest {
        AnswerRequest {
            correct,
            question: None,
            details: Default::default(),
        }
    }

    async fn playing(game: GameType, scoring: Scoring) -> SharedState {
        let config = AppConfig::default().with_scoring(game, scoring);
        let state = AppState::new(config, ChallengeLibrary::builtin());
        state
            .console()
            .write()
            .await
            .set_player("Mia", 3, &[2, 3, 4, 5])
            .unwrap();
        start_game(&state, game).await.unwrap();
        state
    }

    #[tokio::test]
    async fn answer_uses_the_game_scoring() {
        let state = playing(
            GameType::Patterns,
            Scoring {
                base_points: 20,
                streak_multiplier: 10,
            },
        )
        .await;

        let first = answer(&state, answer_request(true)).await.unwrap();
        let second = answer(&state, answer_request(true)).await.unwrap();
        assert_eq!(first.points, 20);
        assert_eq!(second.points, 30);
        assert_eq!(second.total_score, 50);
        assert!(first.explanation.is_some());
        assert!(second.next_challenge.is_some());
    }

    #[tokio::test]
    async fn messages_follow_the_outcome() {
        let state = playing(GameType::Binary, Scoring::default()).await;

        let first = answer(&state, answer_request(true)).await.unwrap();
        let kinds: Vec<_> = first.messages.iter().map(|message| message.kind).collect();
        assert_eq!(kinds, vec![MessageKind::Correct, MessageKind::Achievement]);
        assert_eq!(
            first.unlocked,
            vec![AchievementSummary::from(Achievement::FirstWin)]
        );

        let wrong = answer(&state, answer_request(false)).await.unwrap();
        assert_eq!(wrong.messages.len(), 1);
        assert_eq!(wrong.messages[0].kind, MessageKind::Wrong);
        assert_eq!(wrong.streak, 0);
    }

    #[tokio::test]
    async fn streak_milestone_adds_a_message() {
        let state = playing(GameType::Sorting, Scoring::default()).await;
        answer(&state, answer_request(true)).await.unwrap();
        answer(&state, answer_request(true)).await.unwrap();
        let third = answer(&state, answer_request(true)).await.unwrap();
        assert!(
            third
                .messages
                .iter()
                .any(|message| message.kind == MessageKind::Streak)
        );
    }

    #[tokio::test]
    async fn stalled_message_provider_does_not_block_answers() {
        let messages = MessageService::new(Some(Arc::new(StalledProvider)), &HashMap::new())
            .with_timeout(Duration::from_millis(50));
        let state = AppState::with_messages(
            AppConfig::default(),
            ChallengeLibrary::builtin(),
            messages,
        );
        state.publish_ai_messages(true);
        state
            .console()
            .write()
            .await
            .set_player("Mia", 3, &[2, 3, 4, 5])
            .unwrap();
        start_game(&state, GameType::Binary).await.unwrap();

        let response = tokio::time::timeout(
            Duration::from_secs(2),
            answer(&state, answer_request(true)),
        )
        .await
        .expect("answer completes despite a silent provider")
        .unwrap();

        let kinds: Vec<_> = response.messages.iter().map(|message| message.kind).collect();
        assert_eq!(kinds, vec![MessageKind::Correct, MessageKind::Achievement]);
        assert!(response.messages.iter().all(|message| !message.cached));
        assert!(response.messages[0].message.contains("Mia"));
    }

    #[tokio::test]
    async fn answer_outside_a_game_is_rejected() {
        let state = AppState::new(AppConfig::default(), ChallengeLibrary::builtin());
        assert!(matches!(
            answer(&state, answer_request(true)).await,
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn catalog_lists_every_game() {
        let state = AppState::new(AppConfig::default(), ChallengeLibrary::builtin());
        let entries = catalog(&state).await;
        assert_eq!(entries.len(), GameType::ALL.len());
        let animals = entries
            .iter()
            .find(|entry| entry.game_type == GameType::Animals)
            .unwrap();
        assert!(animals.category_partitioned);
        assert!(!animals.categories.is_empty());
    }
}
