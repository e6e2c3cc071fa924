use std::{sync::Arc, time::Duration};

use codequest::{
    challenges::ChallengeLibrary,
    config::AppConfig,
    dao::store::memory::MemoryStore,
    dto::{
        game::AnswerRequest, live::CreateLiveSessionRequest, player::SetPlayerRequest,
    },
    services::{game_service, live_session_poller, player_service, teacher_service},
    state::{
        AppState, SharedState,
        catalog::{Activity, GameType},
        console::{LiveAssignment, ResolutionEffect},
        session::Scoring,
    },
};

async fn eventually<F>(mut check: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !check() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

async fn setup(store: &MemoryStore, config: AppConfig, name: &str, class_level: u8) -> (SharedState, String) {
    let state = AppState::new(config, ChallengeLibrary::builtin());
    state.set_store(Arc::new(store.clone())).await;

    let setup = player_service::set_player(
        &state,
        SetPlayerRequest {
            name: name.into(),
            class_level,
        },
    )
    .await
    .unwrap();
    setup.session_task.unwrap().await.unwrap();

    let session_id = state
        .console()
        .read()
        .await
        .player()
        .and_then(|player| player.session_id.clone())
        .unwrap();
    (state, session_id)
}

fn correct() -> AnswerRequest {
    AnswerRequest {
        correct: true,
        question: None,
        details: Default::default(),
    }
}

#[tokio::test]
async fn three_correct_answers_with_custom_scoring() {
    let store = MemoryStore::new();
    let config = AppConfig::default().with_scoring(
        GameType::Binary,
        Scoring {
            base_points: 20,
            streak_multiplier: 10,
        },
    );
    let (state, session_id) = setup(&store, config, "Олена", 2).await;
    assert_eq!(store.session(&session_id).unwrap().player_name, "Олена");

    game_service::start_game(&state, GameType::Binary).await.unwrap();

    let mut points = Vec::new();
    let mut first_wins = 0;
    for _ in 0..3 {
        let response = game_service::answer(&state, correct()).await.unwrap();
        points.push(response.points);
        first_wins += response
            .unlocked
            .iter()
            .filter(|badge| badge.id == "first_win")
            .count();
    }

    assert_eq!(points, vec![20, 30, 40]);
    assert_eq!(first_wins, 1);

    let snapshot = game_service::snapshot(&state).await;
    assert_eq!(snapshot.score, 90);
    assert_eq!(snapshot.streak, 3);
    assert_eq!(snapshot.max_streak, 3);

    eventually(|| store.game_results(&session_id).len() == 3).await;
    let scores: Vec<u32> = store
        .game_results(&session_id)
        .iter()
        .map(|result| result.score)
        .collect();
    assert_eq!(scores, vec![20, 50, 90]);

    assert!(player_service::end_current_session(&state).await);
    let stats = store.session(&session_id).unwrap().final_stats.unwrap();
    assert_eq!(stats.total_score, 90);
    assert_eq!(stats.max_streak, 3);
}

#[tokio::test]
async fn live_session_forces_records_and_releases() {
    let store = MemoryStore::new();
    let config = AppConfig::default().with_teacher_token("secret");
    let (state, _) = setup(&store, config, "Олена", 2).await;
    game_service::start_game(&state, GameType::Patterns).await.unwrap();

    let created = teacher_service::create_live_session(
        &state,
        CreateLiveSessionRequest {
            title: "Binary sprint".into(),
            activity: Activity::game(GameType::Binary),
            player_class: 2,
            participants: vec!["all".into()],
        },
    )
    .await
    .unwrap();

    let effect = live_session_poller::poll_once(&state).await.unwrap();
    assert!(matches!(effect, ResolutionEffect::Forced { .. }));
    assert_eq!(
        game_service::snapshot(&state).await.current_game,
        Some(Activity::game(GameType::Binary))
    );

    game_service::answer(&state, correct()).await.unwrap();
    eventually(|| {
        store
            .live_session(&created.id)
            .is_some_and(|session| session.results.get("Олена").is_some_and(|answers| answers.len() == 1))
    })
    .await;

    teacher_service::end_live_session(&state, &created.id)
        .await
        .unwrap();
    assert_eq!(
        live_session_poller::poll_once(&state).await,
        Some(ResolutionEffect::Released)
    );
    {
        let console = state.console().read().await;
        assert_eq!(console.current_game(), None);
        assert!(matches!(console.live(), LiveAssignment::Completed(_)));
    }

    // Answers after completion are no longer mirrored into the live session.
    game_service::start_game(&state, GameType::Binary).await.unwrap();
    game_service::answer(&state, correct()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.live_session(&created.id).unwrap().results["Олена"].len(), 1);
}

#[tokio::test]
async fn other_grade_is_never_forced() {
    let store = MemoryStore::new();
    let (state, _) = setup(&store, AppConfig::default(), "Ivan", 4).await;

    teacher_service::create_live_session(
        &state,
        CreateLiveSessionRequest {
            title: "Grade 2 only".into(),
            activity: Activity::game(GameType::Words),
            player_class: 2,
            participants: vec!["Ivan".into()],
        },
    )
    .await
    .unwrap();

    assert_eq!(
        live_session_poller::poll_once(&state).await,
        Some(ResolutionEffect::Unchanged)
    );
    assert_eq!(game_service::snapshot(&state).await.current_game, None);
}
