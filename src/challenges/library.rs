use std::{collections::HashMap, collections::HashSet, env, fs, path::PathBuf, sync::Arc};

use serde::Deserialize;
use tracing::{info, warn};

use super::Challenge;
use crate::state::catalog::GameType;

/// Environment variable pointing at a replacement content file.
const CONTENT_PATH_ENV: &str = "CODEQUEST_CONTENT_PATH";
/// Content shipped with the binary.
const BUILTIN_CONTENT: &str = include_str!("../../content/challenges.json");

#[derive(Debug, Deserialize)]
/// JSON representation of a content file.
struct RawLibrary {
    challenges: Vec<Challenge>,
}

/// Challenge libraries grouped by game.
#[derive(Debug, Clone, Default)]
pub struct ChallengeLibrary {
    by_game: HashMap<GameType, Arc<[Challenge]>>,
}

impl ChallengeLibrary {
    /// Load content from `CODEQUEST_CONTENT_PATH`, falling back to the built-in library.
    pub fn load() -> Self {
        let Some(path) = env::var_os(CONTENT_PATH_ENV)
            .map(PathBuf::from)
            .filter(|path| !path.as_os_str().is_empty())
        else {
            return Self::builtin();
        };

        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(library) => {
                    info!(
                        path = %path.display(),
                        count = library.len(),
                        "loaded challenge content"
                    );
                    library
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse challenge content; using built-in library"
                    );
                    Self::builtin()
                }
            },
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read challenge content; using built-in library"
                );
                Self::builtin()
            }
        }
    }

    /// Library compiled into the binary.
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_CONTENT).unwrap_or_else(|err| {
            warn!(error = %err, "built-in challenge content is invalid; starting empty");
            Self::default()
        })
    }

    /// Parse a content file, dropping malformed or duplicated challenges.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        let raw: RawLibrary = serde_json::from_str(contents)?;
        Ok(Self::from_challenges(raw.challenges))
    }

    /// Group challenges by game, dropping malformed or duplicated ones.
    pub fn from_challenges(challenges: Vec<Challenge>) -> Self {
        let mut seen = HashSet::new();
        let mut grouped: HashMap<GameType, Vec<Challenge>> = HashMap::new();

        for challenge in challenges {
            if challenge.answers.is_empty() || challenge.prompt.trim().is_empty() {
                warn!(id = %challenge.id, "skipping challenge without prompt or answers");
                continue;
            }
            if !seen.insert(challenge.id.clone()) {
                warn!(id = %challenge.id, "skipping duplicated challenge id");
                continue;
            }
            grouped.entry(challenge.game_type).or_default().push(challenge);
        }

        Self {
            by_game: grouped
                .into_iter()
                .map(|(game, list)| (game, Arc::from(list)))
                .collect(),
        }
    }

    /// Challenges of one game, in file order.
    pub fn for_game(&self, game: GameType) -> Arc<[Challenge]> {
        self.by_game
            .get(&game)
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    /// Distinct categories of one game, in first-seen order.
    pub fn categories(&self, game: GameType) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for challenge in self.for_game(game).iter() {
            if let Some(category) = &challenge.category {
                if !categories.contains(category) {
                    categories.push(category.clone());
                }
            }
        }
        categories
    }

    /// Total number of challenges across games.
    pub fn len(&self) -> usize {
        self.by_game.values().map(|list| list.len()).sum()
    }

    /// Whether no challenge is loaded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_content_covers_every_game() {
        let library = ChallengeLibrary::builtin();
        for game in GameType::ALL {
            assert!(
                !library.for_game(game).is_empty(),
                "no built-in content for {game}"
            );
        }
        for game in GameType::ALL.into_iter().filter(|g| g.is_category_partitioned()) {
            assert!(library.categories(game).len() >= 2, "{game} lacks categories");
        }
    }

    #[test]
    fn drops_duplicates_and_empty_answers() {
        let library = ChallengeLibrary::from_json(
            r#"{"challenges": [
                {"id": "a", "game_type": "binary", "prompt": "1 + 1?", "answers": ["10"], "explanation": "carry"},
                {"id": "a", "game_type": "binary", "prompt": "dup", "answers": ["1"], "explanation": ""},
                {"id": "b", "game_type": "binary", "prompt": "none", "answers": [], "explanation": ""}
            ]}"#,
        )
        .unwrap();
        assert_eq!(library.len(), 1);
        assert_eq!(library.for_game(GameType::Binary)[0].prompt, "1 + 1?");
        assert!(library.for_game(GameType::Words).is_empty());
    }
}
