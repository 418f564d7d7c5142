/// Password Hashing and Verification
///
/// bcrypt for storage and comparison, plus the strength rules applied at
/// registration.

use bcrypt::{hash, verify, DEFAULT_COST};
use lazy_static::lazy_static;

use crate::error::{AppError, AuthError, ValidationError};

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

lazy_static! {
    // Compared against when the account does not exist, so an unknown
    // username costs the same bcrypt round as a wrong password.
    static ref DUMMY_HASH: Option<String> = hash("authgate-timing-equaliser", DEFAULT_COST).ok();
}

/// Hash a password using bcrypt
///
/// # Errors
/// Returns error if:
/// - Password fails validation (too short, weak, etc.)
/// - Bcrypt hashing fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    validate_password_strength(password)?;

    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
///
/// # Errors
/// Returns error if the stored hash cannot be parsed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

/// Check a submitted password against the stored hash.
///
/// A mismatch is `InvalidCredentials` and nothing more specific.
pub fn verify_credentials(password: &str, password_hash: &str) -> Result<(), AppError> {
    if verify_password(password, password_hash)? {
        Ok(())
    } else {
        Err(AuthError::InvalidCredentials.into())
    }
}

/// Burn one bcrypt comparison without a real account
pub fn verify_against_dummy(password: &str) {
    if let Some(dummy) = DUMMY_HASH.as_ref() {
        let _ = verify(password, dummy);
    }
}

/// Validate password strength requirements
///
/// Requirements:
/// - Minimum 8 characters
/// - Maximum 128 characters
/// - At least one digit
/// - At least one lowercase letter
/// - At least one uppercase letter
fn validate_password_strength(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::TooShort(
            "password".to_string(),
            MIN_PASSWORD_LENGTH,
        )));
    }

    // bcrypt limitation and DoS prevention
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_LENGTH,
        )));
    }

    let has_digit = password.chars().any(|c| c.is_numeric());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());

    if !has_digit || !has_lowercase || !has_uppercase {
        return Err(AppError::Validation(ValidationError::InvalidFormat(
            "password must contain at least one digit, one lowercase letter, and one uppercase letter"
                .to_string(),
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = "ValidPassword123";
        let hash = hash_password(password).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn test_verify_credentials() {
        let hash = bcrypt::hash("correct", 4).unwrap();

        assert!(verify_credentials("correct", &hash).is_ok());

        let err = verify_credentials("wrong", &hash).unwrap_err();
        assert_eq!(err.auth_kind(), Some(AuthError::InvalidCredentials));
    }

    #[test]
    fn test_verify_with_corrupt_hash_is_internal() {
        let err = verify_credentials("correct", "not-a-bcrypt-hash").unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_dummy_verification_does_not_panic() {
        verify_against_dummy("anything");
    }

    #[test]
    fn test_too_short_password() {
        assert!(hash_password("Short1").is_err());
    }

    #[test]
    fn test_too_long_password() {
        let long_password = "a".repeat(MAX_PASSWORD_LENGTH + 1) + "A1";
        assert!(hash_password(&long_password).is_err());
    }

    #[test]
    fn test_missing_character_classes() {
        assert!(hash_password("NoDigitsPassword").is_err());
        assert!(hash_password("NOLOWERCASE1").is_err());
        assert!(hash_password("nouppercase1").is_err());
    }
}
