//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest player name accepted, in characters.
pub const MAX_PLAYER_NAME_CHARS: usize = 64;

/// Validates a player name: not blank, at most [`MAX_PLAYER_NAME_CHARS`] characters and no
/// control characters.
///
/// Names are compared exactly (case-sensitive) afterwards, so nothing is normalized here and
/// `" alice"` is a different player than `"alice"`.
///
/// # Examples
///
/// ```ignore
/// validate_player_name("alice")   // Ok
/// validate_player_name(" alice")  // Ok - kept as typed
/// validate_player_name("   ")     // Err - blank
/// validate_player_name("")        // Err - empty
/// ```
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        let mut err = ValidationError::new("player_name_empty");
        err.message = Some("Player name must not be empty".into());
        return Err(err);
    }

    let length = name.chars().count();
    if length > MAX_PLAYER_NAME_CHARS {
        let mut err = ValidationError::new("player_name_length");
        err.message = Some(
            format!("Player name must be at most {MAX_PLAYER_NAME_CHARS} characters (got {length})")
                .into(),
        );
        return Err(err);
    }

    if name.trim().is_empty() {
        let mut err = ValidationError::new("player_name_blank");
        err.message = Some("Player name must not be blank".into());
        return Err(err);
    }

    if name.chars().any(char::is_control) {
        let mut err = ValidationError::new("player_name_format");
        err.message = Some("Player name must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_player_name_valid() {
        assert!(validate_player_name("alice").is_ok());
        assert!(validate_player_name("Alice Cooper").is_ok());
        assert!(validate_player_name("Zoë").is_ok());
        assert!(validate_player_name(" alice").is_ok()); // kept as typed
        assert!(validate_player_name("alice ").is_ok());
        assert!(validate_player_name(&"x".repeat(MAX_PLAYER_NAME_CHARS)).is_ok());
    }

    #[test]
    fn test_validate_player_name_invalid_length() {
        assert!(validate_player_name("").is_err());
        assert!(validate_player_name(&"x".repeat(MAX_PLAYER_NAME_CHARS + 1)).is_err());
    }

    #[test]
    fn test_validate_player_name_invalid_format() {
        assert!(validate_player_name("alice\t").is_err()); // tab is a control char
        assert!(validate_player_name("   ").is_err()); // whitespace only
        assert!(validate_player_name("al\u{0}ice").is_err()); // control char
    }
}
