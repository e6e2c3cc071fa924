//! Player identity for the current browsing session and the guard around
//! remote session creation.

use thiserror::Error;

/// Longest accepted player name, in characters.
pub const MAX_NAME_CHARS: usize = 40;

/// Identity of the player using this console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Display name, trimmed and non-empty.
    pub name: String,
    /// Grade level.
    pub class_level: u8,
    /// Identifier assigned once by the remote session store.
    pub session_id: Option<String>,
}

/// Rejections raised before any remote call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Name is empty after trimming.
    #[error("player name must not be empty")]
    EmptyName,
    /// Name exceeds [`MAX_NAME_CHARS`].
    #[error("player name must be at most {MAX_NAME_CHARS} characters")]
    NameTooLong,
    /// Grade outside the configured set.
    #[error("unsupported class level {class_level} (supported: {supported:?})")]
    UnsupportedClass {
        /// Rejected grade.
        class_level: u8,
        /// Grades accepted by this deployment.
        supported: Vec<u8>,
    },
}

/// Permission to create the remote session for one identity generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTicket {
    generation: u64,
    /// Name sent to the store.
    pub name: String,
    /// Grade sent to the store.
    pub class_level: u8,
}

/// Holder of the player identity.
///
/// Creation of the remote session is requested at most once while a request
/// is in flight or an identifier is already known. A generation counter
/// discards identifiers that resolve after the identity was cleared.
#[derive(Debug, Default)]
pub struct PlayerIdentity {
    player: Option<Player>,
    generation: u64,
    pending: bool,
}

impl PlayerIdentity {
    /// Identity without a player.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current player, if one is set.
    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    /// Whether a remote session creation is in flight.
    pub fn session_pending(&self) -> bool {
        self.pending
    }

    /// Validate and install the identity.
    ///
    /// Returns a ticket when the caller must create the remote session; `None`
    /// when a session identifier is already known or a creation is in flight.
    pub fn set_player(
        &mut self,
        name: &str,
        class_level: u8,
        supported: &[u8],
    ) -> Result<Option<SessionTicket>, IdentityError> {
        let name = validate_name(name)?;
        if !supported.contains(&class_level) {
            return Err(IdentityError::UnsupportedClass {
                class_level,
                supported: supported.to_vec(),
            });
        }

        let session_id = self.player.take().and_then(|player| player.session_id);
        let needs_session = session_id.is_none() && !self.pending;
        self.player = Some(Player {
            name: name.clone(),
            class_level,
            session_id,
        });

        if !needs_session {
            return Ok(None);
        }

        self.pending = true;
        Ok(Some(SessionTicket {
            generation: self.generation,
            name,
            class_level,
        }))
    }

    /// Store the identifier returned by the session store.
    ///
    /// Returns `false` when the ticket is stale or an identifier is already set.
    pub fn resolve_session(&mut self, ticket: &SessionTicket, session_id: String) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        self.pending = false;
        match self.player.as_mut() {
            Some(player) if player.session_id.is_none() => {
                player.session_id = Some(session_id);
                true
            }
            _ => false,
        }
    }

    /// Forget an in-flight creation that failed so a later setup may retry.
    pub fn fail_session(&mut self, ticket: &SessionTicket) {
        if ticket.generation == self.generation {
            self.pending = false;
        }
    }

    /// Reset the identity, discarding (not deleting) the remote session reference.
    pub fn clear(&mut self) -> Option<Player> {
        self.generation += 1;
        self.pending = false;
        self.player.take()
    }
}

fn validate_name(name: &str) -> Result<String, IdentityError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(IdentityError::EmptyName);
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(IdentityError::NameTooLong);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRADES: &[u8] = &[2, 3, 4, 5];

    #[test]
    fn rejects_blank_name_and_unknown_grade() {
        let mut identity = PlayerIdentity::new();
        assert_eq!(
            identity.set_player("   ", 2, GRADES).unwrap_err(),
            IdentityError::EmptyName
        );
        assert!(matches!(
            identity.set_player("Олена", 7, GRADES).unwrap_err(),
            IdentityError::UnsupportedClass { class_level: 7, .. }
        ));
        assert!(identity.player().is_none());
        assert!(!identity.session_pending());
    }

    #[test]
    fn session_is_requested_once() {
        let mut identity = PlayerIdentity::new();
        let ticket = identity.set_player(" Олена ", 2, GRADES).unwrap().unwrap();
        assert_eq!(ticket.name, "Олена");
        assert!(identity.set_player("Олена", 2, GRADES).unwrap().is_none());

        assert!(identity.resolve_session(&ticket, "s-1".into()));
        assert!(identity.set_player("Олена", 3, GRADES).unwrap().is_none());

        let player = identity.player().unwrap();
        assert_eq!(player.session_id.as_deref(), Some("s-1"));
        assert_eq!(player.class_level, 3);
    }

    #[test]
    fn session_id_is_never_reassigned() {
        let mut identity = PlayerIdentity::new();
        let ticket = identity.set_player("Ivan", 4, GRADES).unwrap().unwrap();
        assert!(identity.resolve_session(&ticket, "s-1".into()));
        assert!(!identity.resolve_session(&ticket, "s-2".into()));
        assert_eq!(
            identity.player().unwrap().session_id.as_deref(),
            Some("s-1")
        );
    }

    #[test]
    fn stale_ticket_after_clear_is_discarded() {
        let mut identity = PlayerIdentity::new();
        let ticket = identity.set_player("Ivan", 4, GRADES).unwrap().unwrap();
        identity.clear();

        let fresh = identity.set_player("Mia", 5, GRADES).unwrap().unwrap();
        assert!(!identity.resolve_session(&ticket, "old".into()));
        assert!(identity.session_pending());
        assert!(identity.resolve_session(&fresh, "new".into()));
        assert_eq!(identity.player().unwrap().session_id.as_deref(), Some("new"));
    }

    #[test]
    fn failed_creation_allows_retry() {
        let mut identity = PlayerIdentity::new();
        let ticket = identity.set_player("Ivan", 4, GRADES).unwrap().unwrap();
        identity.fail_session(&ticket);
        assert!(identity.set_player("Ivan", 4, GRADES).unwrap().is_some());
    }
}
