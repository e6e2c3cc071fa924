//! The player console: every piece of state one browsing session owns.
//!
//! All methods are synchronous reducers. Remote effects are described by the
//! returned values and executed by the services once the lock is released.

use std::{collections::HashMap, sync::Arc};

use thiserror::Error;

use crate::{
    challenges::{Challenge, ChallengeFilter, ChallengeLibrary, ChallengeManager},
    dao::models::LiveSessionEntity,
    services::live_session_resolver::Resolution,
    state::{
        catalog::{Activity, GameType},
        player::{IdentityError, Player, PlayerIdentity, SessionTicket},
        session::{GameSessionState, OutcomeReport, Scoring},
        state_machine::{GameEvent, GamePhase, GameStateMachine, InvalidTransition},
    },
};

/// Rejections of player intents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    /// No player identity is set.
    #[error("no player is set up")]
    NoPlayer,
    /// Answer received while no game is running.
    #[error("no game is running")]
    NotPlaying,
    /// Category not offered by the pending game.
    #[error("unknown category `{category}` for {game_type}")]
    UnknownCategory {
        /// Game waiting for a category.
        game_type: GameType,
        /// Rejected category.
        category: String,
    },
    /// Navigation not allowed from the current phase.
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}

/// Live session currently assigned to the player.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LiveAssignment {
    /// Free play.
    #[default]
    None,
    /// Running broadcast; answers are mirrored into its results.
    Active(LiveSessionEntity),
    /// Finished broadcast, shown for review only.
    Completed(LiveSessionEntity),
}

impl LiveAssignment {
    /// Assigned session, whatever its status.
    pub fn session(&self) -> Option<&LiveSessionEntity> {
        match self {
            LiveAssignment::Active(session) | LiveAssignment::Completed(session) => Some(session),
            LiveAssignment::None => None,
        }
    }

    /// Identifier of the assigned session when it is still running.
    pub fn active_id(&self) -> Option<&str> {
        match self {
            LiveAssignment::Active(session) => Some(&session.id),
            _ => None,
        }
    }
}

/// How a resolution pass changed the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionEffect {
    /// A new active session forced the player into its activity.
    Forced {
        /// Session that took over.
        live_session_id: String,
        /// Activity now running.
        activity: Activity,
    },
    /// The forcing session went away; the player is back in free play.
    Released,
    /// The assignment changed without any navigation.
    Reassigned,
    /// Same assignment as before.
    Unchanged,
}

/// Where the outcome of one answer must be mirrored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    /// Player who answered; key of the live results map.
    pub player_name: String,
    /// Remote session log, once its identifier is known.
    pub session_id: Option<String>,
    /// Live session receiving the answer, when one is assigned and active.
    pub live_session_id: Option<String>,
}

/// Everything produced by one answer.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    /// Activity that was answered.
    pub activity: Activity,
    /// Challenge that was answered, if one had been served.
    pub answered: Option<Challenge>,
    /// Score bookkeeping after the answer.
    pub report: OutcomeReport,
    /// Next challenge served.
    pub next: Option<Challenge>,
    /// Remote mirrors to update.
    pub sync: SyncTarget,
}

/// Owner of identity, navigation, scores, challenges and the live assignment.
pub struct PlayerConsole {
    library: Arc<ChallengeLibrary>,
    history_window: usize,
    identity: PlayerIdentity,
    machine: GameStateMachine,
    session: GameSessionState,
    live: LiveAssignment,
    managers: HashMap<GameType, ChallengeManager<Challenge>>,
    current_challenge: Option<Challenge>,
    show_celebration: bool,
}

impl PlayerConsole {
    /// Console without a player.
    pub fn new(library: Arc<ChallengeLibrary>, history_window: usize) -> Self {
        Self {
            library,
            history_window,
            identity: PlayerIdentity::new(),
            machine: GameStateMachine::new(),
            session: GameSessionState::new(),
            live: LiveAssignment::None,
            managers: HashMap::new(),
            current_challenge: None,
            show_celebration: false,
        }
    }

    /// Current player.
    pub fn player(&self) -> Option<&Player> {
        self.identity.player()
    }

    /// Whether remote session creation is in flight.
    pub fn session_pending(&self) -> bool {
        self.identity.session_pending()
    }

    /// Navigation phase.
    pub fn phase(&self) -> &GamePhase {
        self.machine.phase()
    }

    /// Navigation version, bumped on every transition.
    pub fn version(&self) -> usize {
        self.machine.snapshot().version
    }

    /// Running activity.
    pub fn current_game(&self) -> Option<Activity> {
        self.machine.current_game()
    }

    /// Chosen category of a partitioned game.
    pub fn selected_category(&self) -> Option<&str> {
        self.machine.selected_category()
    }

    /// Score, streak and badges.
    pub fn scores(&self) -> &GameSessionState {
        &self.session
    }

    /// Live session assignment.
    pub fn live(&self) -> &LiveAssignment {
        &self.live
    }

    /// Challenge currently served.
    pub fn current_challenge(&self) -> Option<&Challenge> {
        self.current_challenge.as_ref()
    }

    /// Whether the last answer unlocked a badge.
    pub fn show_celebration(&self) -> bool {
        self.show_celebration
    }

    /// Content library backing the challenge managers.
    pub fn library(&self) -> &ChallengeLibrary {
        &self.library
    }

    /// Set up the player. A first setup starts a fresh score state.
    pub fn set_player(
        &mut self,
        name: &str,
        class_level: u8,
        supported: &[u8],
    ) -> Result<Option<SessionTicket>, IdentityError> {
        let first_setup = self.identity.player().is_none();
        let ticket = self.identity.set_player(name, class_level, supported)?;
        if first_setup {
            self.session = GameSessionState::new();
        }
        Ok(ticket)
    }

    /// Record the identifier of the remote session.
    pub fn resolve_session(&mut self, ticket: &SessionTicket, session_id: String) -> bool {
        self.identity.resolve_session(ticket, session_id)
    }

    /// Forget a failed remote session creation.
    pub fn fail_session(&mut self, ticket: &SessionTicket) {
        self.identity.fail_session(ticket);
    }

    /// Log out: identity, navigation, scores and assignment all reset.
    pub fn clear_player(&mut self) -> Option<Player> {
        let player = self.identity.clear();
        self.machine = GameStateMachine::new();
        self.session = GameSessionState::new();
        self.live = LiveAssignment::None;
        self.managers.clear();
        self.current_challenge = None;
        self.show_celebration = false;
        player
    }

    /// Pick a game from the menu.
    pub fn start_game(&mut self, game_type: GameType) -> Result<&GamePhase, ConsoleError> {
        self.require_player()?;
        self.machine.apply(GameEvent::StartGame(game_type))?;
        self.show_celebration = false;
        self.serve_challenge();
        Ok(self.machine.phase())
    }

    /// Pick the category of the pending partitioned game.
    pub fn select_category(&mut self, category: &str) -> Result<&GamePhase, ConsoleError> {
        self.require_player()?;
        if let GamePhase::CategorySelecting(game_type) = self.machine.phase() {
            let game_type = *game_type;
            if !self
                .library
                .categories(game_type)
                .iter()
                .any(|known| known == category)
            {
                return Err(ConsoleError::UnknownCategory {
                    game_type,
                    category: category.to_string(),
                });
            }
        }
        self.machine
            .apply(GameEvent::SelectCategory(category.to_string()))?;
        self.serve_challenge();
        Ok(self.machine.phase())
    }

    /// Return to the menu; scores, streaks and badges are kept.
    pub fn back_to_menu(&mut self) -> &GamePhase {
        self.current_challenge = None;
        self.show_celebration = false;
        // BackToMenu is valid from every phase.
        let _ = self.machine.apply(GameEvent::BackToMenu);
        self.machine.phase()
    }

    /// Record an answer to the running activity and serve the next challenge.
    pub fn answer(&mut self, correct: bool, scoring: Scoring) -> Result<AnswerOutcome, ConsoleError> {
        let player = self.require_player()?.clone();
        let activity = self
            .machine
            .active()
            .map(|active| active.activity.clone())
            .ok_or(ConsoleError::NotPlaying)?;

        let points = scoring.points_for(self.session.streak());
        let report = self
            .session
            .record_outcome(correct, points, activity.game_type());
        self.show_celebration = !report.unlocked.is_empty();

        let answered = self.current_challenge.take();
        let next = self.serve_challenge();

        Ok(AnswerOutcome {
            activity,
            answered,
            report,
            next,
            sync: SyncTarget {
                player_name: player.name,
                session_id: player.session_id,
                live_session_id: self.live.active_id().map(str::to_string),
            },
        })
    }

    /// Apply the result of a live-session poll.
    pub fn apply_resolution(&mut self, resolution: Resolution) -> ResolutionEffect {
        let previous = self.live.session().map(|session| session.id.clone());

        match resolution {
            Resolution::Active(session) => {
                let already_assigned = self.live.active_id() == Some(session.id.as_str());
                let live_session_id = session.id.clone();
                let activity = session.activity.clone();
                self.live = LiveAssignment::Active(session);
                if already_assigned {
                    return ResolutionEffect::Unchanged;
                }

                // ForceStart is valid from every phase.
                let _ = self.machine.apply(GameEvent::ForceStart {
                    activity: activity.clone(),
                    live_session_id: live_session_id.clone(),
                });
                self.show_celebration = false;
                self.serve_challenge();
                ResolutionEffect::Forced {
                    live_session_id,
                    activity,
                }
            }
            Resolution::Completed(session) => {
                let changed = previous.as_deref() != Some(session.id.as_str())
                    || self.live.active_id().is_some();
                self.live = LiveAssignment::Completed(session);
                self.settle(changed)
            }
            Resolution::None => {
                let changed = previous.is_some();
                self.live = LiveAssignment::None;
                self.settle(changed)
            }
        }
    }

    /// Leave a forced activity once no active session backs it.
    fn settle(&mut self, changed: bool) -> ResolutionEffect {
        let forced = self
            .machine
            .active()
            .is_some_and(|active| active.live_session_id.is_some());
        if forced {
            self.back_to_menu();
            ResolutionEffect::Released
        } else if changed {
            ResolutionEffect::Reassigned
        } else {
            ResolutionEffect::Unchanged
        }
    }

    fn require_player(&self) -> Result<&Player, ConsoleError> {
        self.identity.player().ok_or(ConsoleError::NoPlayer)
    }

    fn serve_challenge(&mut self) -> Option<Challenge> {
        let Some(active) = self.machine.active() else {
            self.current_challenge = None;
            return None;
        };
        let Some(game_type) = active.activity.game_type() else {
            self.current_challenge = None;
            return None;
        };
        let filter = ChallengeFilter {
            category: active.category.clone(),
            max_difficulty: None,
        };

        let library = &self.library;
        let window = self.history_window;
        let manager = self
            .managers
            .entry(game_type)
            .or_insert_with(|| ChallengeManager::new(library.for_game(game_type), window));

        self.current_challenge = manager.load_next(&filter).cloned();
        self.current_challenge.clone()
    }
}
