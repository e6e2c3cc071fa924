//! Known mini-games and the activities a player can be placed into.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identifier of a built-in mini-game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    /// Encode and decode numbers and letters in binary.
    Binary,
    /// Put algorithm steps in the right order.
    Algorithms,
    /// Sort items by comparing them.
    Sorting,
    /// Follow and complete flowcharts.
    Flowchart,
    /// Spot and continue patterns.
    Patterns,
    /// Animal facts, split into categories.
    Animals,
    /// Word building, split into categories.
    Words,
}

impl GameType {
    /// Every built-in game, in menu order.
    pub const ALL: [GameType; 7] = [
        GameType::Binary,
        GameType::Algorithms,
        GameType::Sorting,
        GameType::Flowchart,
        GameType::Patterns,
        GameType::Animals,
        GameType::Words,
    ];

    /// Whether the player must pick a category before the game starts.
    pub fn is_category_partitioned(self) -> bool {
        matches!(self, GameType::Animals | GameType::Words)
    }

    /// Stable wire name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            GameType::Binary => "binary",
            GameType::Algorithms => "algorithms",
            GameType::Sorting => "sorting",
            GameType::Flowchart => "flowchart",
            GameType::Patterns => "patterns",
            GameType::Animals => "animals",
            GameType::Words => "words",
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire name used for answers given inside a teacher-authored test.
pub const CUSTOM_TEST_LABEL: &str = "custom_test";

/// What the player is doing while a game is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Activity {
    /// One of the built-in mini-games.
    Game {
        /// Which game is running.
        game_type: GameType,
    },
    /// A teacher-authored test referenced by identifier.
    CustomTest {
        /// Identifier of the test in the teacher's library.
        test_id: String,
    },
}

impl Activity {
    /// Shortcut for a built-in game activity.
    pub fn game(game_type: GameType) -> Self {
        Activity::Game { game_type }
    }

    /// The built-in game behind this activity, if any.
    pub fn game_type(&self) -> Option<GameType> {
        match self {
            Activity::Game { game_type } => Some(*game_type),
            Activity::CustomTest { .. } => None,
        }
    }

    /// Label recorded alongside results for this activity.
    pub fn label(&self) -> &'static str {
        match self {
            Activity::Game { game_type } => game_type.as_str(),
            Activity::CustomTest { .. } => CUSTOM_TEST_LABEL,
        }
    }
}
