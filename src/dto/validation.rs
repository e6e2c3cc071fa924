//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::{dao::models::ALL_PARTICIPANTS, state::player::MAX_NAME_CHARS};

/// Validates that a text field holds something besides whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Validates a live-session participant list: `["all"]` or player names.
///
/// # Examples
///
/// ```ignore
/// validate_participants(&["all".into()])                 // Ok
/// validate_participants(&["Mia".into(), "Ivan".into()])  // Ok
/// validate_participants(&["all".into(), "Mia".into()])   // Err - "all" must stand alone
/// validate_participants(&[])                              // Err - empty
/// ```
pub fn validate_participants(participants: &[String]) -> Result<(), ValidationError> {
    if participants.is_empty() {
        let mut err = ValidationError::new("participants_empty");
        err.message = Some("at least one participant (or \"all\") is required".into());
        return Err(err);
    }

    let has_all = participants.iter().any(|name| name == ALL_PARTICIPANTS);
    if has_all && participants.len() > 1 {
        let mut err = ValidationError::new("participants_all_mixed");
        err.message = Some("\"all\" cannot be combined with player names".into());
        return Err(err);
    }

    if let Some(name) = participants
        .iter()
        .find(|name| name.trim().is_empty() || name.chars().count() > MAX_NAME_CHARS)
    {
        let mut err = ValidationError::new("participant_name");
        err.message = Some(format!("invalid participant name {name:?}").into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Mia").is_ok());
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("").is_err());
    }

    #[test]
    fn test_validate_participants() {
        assert!(validate_participants(&["all".into()]).is_ok());
        assert!(validate_participants(&["Mia".into(), "Олена".into()]).is_ok());
        assert!(validate_participants(&[]).is_err());
        assert!(validate_participants(&["all".into(), "Mia".into()]).is_err());
        assert!(validate_participants(&[" ".into()]).is_err());
    }
}
