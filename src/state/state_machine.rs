use thiserror::Error;

use crate::state::catalog::{Activity, GameType};

/// High-level phases of the player's game navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GamePhase {
    /// Menu is displayed; no game is running.
    Idle,
    /// A category-partitioned game was chosen and waits for a category.
    CategorySelecting(GameType),
    /// A game or test is running.
    Active(ActiveGame),
}

/// Data carried while a game is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveGame {
    /// What is being played.
    pub activity: Activity,
    /// Category picked for partitioned games.
    pub category: Option<String>,
    /// Live session that forced this activity, when it was not chosen from the menu.
    pub live_session_id: Option<String>,
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// Player picked a game from the menu.
    StartGame(GameType),
    /// Player picked a category for the pending partitioned game.
    SelectCategory(String),
    /// Player returned to the menu.
    BackToMenu,
    /// A live session assigned an activity, bypassing the menu and any category selector.
    ForceStart {
        /// Activity requested by the live session.
        activity: Activity,
        /// Identifier of the live session.
        live_session_id: String,
    },
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: GamePhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
}

/// Navigation state machine owned by a single player console.
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    phase: GamePhase,
    version: usize,
}

impl Default for GameStateMachine {
    fn default() -> Self {
        Self {
            phase: GamePhase::Idle,
            version: 0,
        }
    }
}

impl GameStateMachine {
    /// Create a new state machine initialised in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> &GamePhase {
        &self.phase
    }

    /// Game chosen by the player, including one still waiting for a category.
    pub fn current_game(&self) -> Option<Activity> {
        match &self.phase {
            GamePhase::Idle => None,
            GamePhase::CategorySelecting(game_type) => Some(Activity::game(*game_type)),
            GamePhase::Active(active) => Some(active.activity.clone()),
        }
    }

    /// Category selected for the running game, if any.
    pub fn selected_category(&self) -> Option<&str> {
        match &self.phase {
            GamePhase::Active(active) => active.category.as_deref(),
            _ => None,
        }
    }

    /// Running game, if the phase is active.
    pub fn active(&self) -> Option<&ActiveGame> {
        match &self.phase {
            GamePhase::Active(active) => Some(active),
            _ => None,
        }
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase.clone(),
            version: self.version,
        }
    }

    /// Apply an event, moving to the next phase when the transition is valid.
    pub fn apply(&mut self, event: GameEvent) -> Result<&GamePhase, InvalidTransition> {
        let next = compute_transition(&self.phase, event)?;
        self.phase = next;
        self.version += 1;
        Ok(&self.phase)
    }
}

/// Compute the phase reached by applying `event` from `from`.
pub fn compute_transition(from: &GamePhase, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
    let next = match (from, event) {
        (GamePhase::Idle, GameEvent::StartGame(game_type)) if game_type.is_category_partitioned() => {
            GamePhase::CategorySelecting(game_type)
        }
        (GamePhase::Idle, GameEvent::StartGame(game_type)) => GamePhase::Active(ActiveGame {
            activity: Activity::game(game_type),
            category: None,
            live_session_id: None,
        }),
        (GamePhase::CategorySelecting(game_type), GameEvent::SelectCategory(category)) => {
            GamePhase::Active(ActiveGame {
                activity: Activity::game(*game_type),
                category: Some(category),
                live_session_id: None,
            })
        }
        (_, GameEvent::BackToMenu) => GamePhase::Idle,
        (
            _,
            GameEvent::ForceStart {
                activity,
                live_session_id,
            },
        ) => GamePhase::Active(ActiveGame {
            activity,
            category: None,
            live_session_id: Some(live_session_id),
        }),
        (from, event) => {
            return Err(InvalidTransition {
                from: from.clone(),
                event,
            });
        }
    };

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut GameStateMachine, event: GameEvent) -> GamePhase {
        sm.apply(event).unwrap().clone()
    }

    #[test]
    fn initial_state_is_idle() {
        let sm = GameStateMachine::new();
        assert_eq!(sm.phase(), &GamePhase::Idle);
        assert!(sm.current_game().is_none());
    }

    #[test]
    fn plain_game_starts_directly() {
        let mut sm = GameStateMachine::new();
        let phase = apply(&mut sm, GameEvent::StartGame(GameType::Binary));
        assert_eq!(
            phase,
            GamePhase::Active(ActiveGame {
                activity: Activity::game(GameType::Binary),
                category: None,
                live_session_id: None,
            })
        );
        assert_eq!(sm.snapshot().version, 1);
    }

    #[test]
    fn partitioned_game_waits_for_category() {
        let mut sm = GameStateMachine::new();
        assert_eq!(
            apply(&mut sm, GameEvent::StartGame(GameType::Animals)),
            GamePhase::CategorySelecting(GameType::Animals)
        );
        assert_eq!(sm.current_game(), Some(Activity::game(GameType::Animals)));
        assert!(sm.selected_category().is_none());

        apply(&mut sm, GameEvent::SelectCategory("birds".into()));
        assert_eq!(sm.current_game(), Some(Activity::game(GameType::Animals)));
        assert_eq!(sm.selected_category(), Some("birds"));
    }

    #[test]
    fn back_to_menu_from_any_phase() {
        let mut sm = GameStateMachine::new();
        assert_eq!(apply(&mut sm, GameEvent::BackToMenu), GamePhase::Idle);

        apply(&mut sm, GameEvent::StartGame(GameType::Words));
        assert_eq!(apply(&mut sm, GameEvent::BackToMenu), GamePhase::Idle);

        apply(&mut sm, GameEvent::StartGame(GameType::Sorting));
        assert_eq!(apply(&mut sm, GameEvent::BackToMenu), GamePhase::Idle);
        assert!(sm.selected_category().is_none());
    }

    #[test]
    fn force_start_bypasses_category_selector() {
        let mut sm = GameStateMachine::new();
        apply(&mut sm, GameEvent::StartGame(GameType::Animals));

        let phase = apply(
            &mut sm,
            GameEvent::ForceStart {
                activity: Activity::game(GameType::Words),
                live_session_id: "live-1".into(),
            },
        );
        match phase {
            GamePhase::Active(active) => {
                assert_eq!(active.activity, Activity::game(GameType::Words));
                assert_eq!(active.category, None);
                assert_eq!(active.live_session_id.as_deref(), Some("live-1"));
            }
            other => panic!("expected active phase, got {other:?}"),
        }
    }

    #[test]
    fn invalid_transition_returns_error() {
        let mut sm = GameStateMachine::new();
        let err = sm
            .apply(GameEvent::SelectCategory("birds".into()))
            .unwrap_err();
        assert_eq!(err.from, GamePhase::Idle);
        assert_eq!(err.event, GameEvent::SelectCategory("birds".into()));
        assert_eq!(sm.snapshot().version, 0);
    }

    #[test]
    fn starting_a_second_game_requires_the_menu() {
        let mut sm = GameStateMachine::new();
        apply(&mut sm, GameEvent::StartGame(GameType::Binary));
        let err = sm.apply(GameEvent::StartGame(GameType::Sorting)).unwrap_err();
        assert!(matches!(err.from, GamePhase::Active(_)));
    }
}
