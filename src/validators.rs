/// Input validators for the auth endpoints
///
/// Usernames are case-sensitive and restricted to a conservative character set
/// so they are safe to echo into logs and use as lookup keys.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 64;
// bcrypt only looks at the first 72 bytes; anything much longer is a DoS vector.
const MAX_LOGIN_PASSWORD_LENGTH: usize = 128;

lazy_static! {
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_.-]+$").unwrap();
}

/// Validates a username for registration
///
/// - Trims surrounding whitespace
/// - 3..=64 characters
/// - Letters, digits, `_`, `.` and `-` only
pub fn is_valid_username(username: &str) -> Result<String, ValidationError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()));
    }

    if trimmed.chars().count() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::TooShort(
            "username".to_string(),
            MIN_USERNAME_LENGTH,
        ));
    }

    if trimmed.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong(
            "username".to_string(),
            MAX_USERNAME_LENGTH,
        ));
    }

    if !USERNAME_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("username".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Shape check for login input. Deliberately does not apply the registration
/// rules: a login attempt with a malformed username is just a failed login.
pub fn require_login_fields(username: &str, password: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()));
    }
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }
    if password.len() > MAX_LOGIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong(
            "password".to_string(),
            MAX_LOGIN_PASSWORD_LENGTH,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_username() {
        assert_eq!(is_valid_username("admin").unwrap(), "admin");
        assert_eq!(is_valid_username("  jane.doe-01 ").unwrap(), "jane.doe-01");
        assert!(is_valid_username("under_score").is_ok());
    }

    #[test]
    fn test_username_length_limits() {
        assert!(is_valid_username("").is_err());
        assert!(is_valid_username("ab").is_err());
        assert!(is_valid_username(&"a".repeat(65)).is_err());
        assert!(is_valid_username(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn test_username_rejects_special_characters() {
        assert!(is_valid_username("john doe").is_err());
        assert!(is_valid_username("admin'--").is_err());
        assert!(is_valid_username("name\0null").is_err());
        assert!(is_valid_username("user@host").is_err());
    }

    #[test]
    fn test_login_fields() {
        assert!(require_login_fields("admin", "correct").is_ok());
        assert!(require_login_fields("   ", "correct").is_err());
        assert!(require_login_fields("admin", "").is_err());
        assert!(require_login_fields("admin", &"x".repeat(129)).is_err());
    }
}
