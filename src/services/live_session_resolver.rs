//! Pure resolution policy choosing the live session that applies to a player.

use crate::dao::models::{LiveSessionEntity, LiveSessionStatus};

/// Outcome of one resolution pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// An active broadcast targets the player and must be force-started.
    Active(LiveSessionEntity),
    /// Only finished broadcasts match; reviewable, never forced.
    Completed(LiveSessionEntity),
    /// Nothing targets the player; free play.
    None,
}

impl Resolution {
    /// Identifier of the resolved session, if any.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Resolution::Active(session) | Resolution::Completed(session) => Some(&session.id),
            Resolution::None => None,
        }
    }
}

/// Whether `session` targets the player `name` of grade `class_level`.
pub fn targets(session: &LiveSessionEntity, name: &str, class_level: u8) -> bool {
    session.player_class == class_level
        && session.includes(name)
        && matches!(
            session.status,
            LiveSessionStatus::Active | LiveSessionStatus::Completed
        )
}

/// Pick the session applying to a player.
///
/// The first matching active session in store order wins. Without one, the
/// most recently created completed session is returned.
pub fn resolve(sessions: Vec<LiveSessionEntity>, name: &str, class_level: u8) -> Resolution {
    let mut latest_completed: Option<LiveSessionEntity> = None;

    for session in sessions {
        if !targets(&session, name, class_level) {
            continue;
        }
        match session.status {
            LiveSessionStatus::Active => return Resolution::Active(session),
            LiveSessionStatus::Completed => {
                let newer = latest_completed
                    .as_ref()
                    .is_none_or(|current| session.created_at > current.created_at);
                if newer {
                    latest_completed = Some(session);
                }
            }
            LiveSessionStatus::Unknown => {}
        }
    }

    latest_completed.map_or(Resolution::None, Resolution::Completed)
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;
    use crate::{
        dao::models::{ALL_PARTICIPANTS, LiveSessionDraft},
        state::catalog::{Activity, GameType},
    };

    fn session(id: &str, class: u8, who: &[&str], status: LiveSessionStatus, age: u64) -> LiveSessionEntity {
        let mut session = LiveSessionEntity::from_draft(
            id.into(),
            LiveSessionDraft {
                title: format!("session {id}"),
                activity: Activity::game(GameType::Binary),
                player_class: class,
                participants: who.iter().map(|name| name.to_string()).collect(),
            },
        );
        session.status = status;
        session.created_at = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000 - age);
        session
    }

    #[test]
    fn active_beats_completed() {
        let sessions = vec![
            session("done", 2, &[ALL_PARTICIPANTS], LiveSessionStatus::Completed, 10),
            session("live", 2, &["Олена"], LiveSessionStatus::Active, 100),
        ];
        let resolution = resolve(sessions, "Олена", 2);
        assert_eq!(resolution.session_id(), Some("live"));
        assert!(matches!(resolution, Resolution::Active(_)));
    }

    #[test]
    fn only_completed_resolves_to_latest() {
        let sessions = vec![
            session("old", 2, &[ALL_PARTICIPANTS], LiveSessionStatus::Completed, 50),
            session("new", 2, &[ALL_PARTICIPANTS], LiveSessionStatus::Completed, 5),
        ];
        let resolution = resolve(sessions, "Ivan", 2);
        assert!(matches!(resolution, Resolution::Completed(ref s) if s.id == "new"));
    }

    #[test]
    fn first_active_wins_ties() {
        let sessions = vec![
            session("a", 3, &[ALL_PARTICIPANTS], LiveSessionStatus::Active, 1),
            session("b", 3, &[ALL_PARTICIPANTS], LiveSessionStatus::Active, 2),
        ];
        assert_eq!(resolve(sessions, "Mia", 3).session_id(), Some("a"));
    }

    #[test]
    fn class_participants_and_status_must_match() {
        let sessions = vec![
            session("wrong-class", 4, &[ALL_PARTICIPANTS], LiveSessionStatus::Active, 1),
            session("other-kid", 2, &["Ivan"], LiveSessionStatus::Active, 1),
            session("weird", 2, &[ALL_PARTICIPANTS], LiveSessionStatus::Unknown, 1),
        ];
        assert_eq!(resolve(sessions, "Mia", 2), Resolution::None);
    }

    #[test]
    fn participant_names_match_exactly() {
        let sessions = vec![session("s", 2, &["mia"], LiveSessionStatus::Active, 1)];
        assert_eq!(resolve(sessions, "Mia", 2), Resolution::None);
    }
}
