use anyhow::Result;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use rand::rngs::OsRng;

use crate::domain::KanbanError;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 8;

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Returns the trimmed username when both fields meet the length rules.
pub fn validate_registration(username: &str, password: &str) -> Result<String, KanbanError> {
    let username = username.trim();
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(KanbanError::InvalidInput(format!(
            "Username must be at least {} characters",
            MIN_USERNAME_LEN
        )));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(KanbanError::InvalidInput(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(username.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_registration_rules() {
        assert_eq!(validate_registration("  alice ", "password1").unwrap(), "alice");
        assert!(validate_registration("al", "password1").is_err());
        assert!(validate_registration("alice", "short").is_err());
    }
}
