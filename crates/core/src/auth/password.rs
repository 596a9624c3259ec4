//! Argon2id password hashing.

use argon2::{
    Argon2, PasswordHash,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Errors raised while hashing or checking a password.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordError {
    /// Hashing failed.
    #[error("Failed to hash password: {0}")]
    Hash(String),

    /// The stored hash is not a PHC string.
    #[error("Stored password hash is malformed")]
    InvalidHash,

    /// Verification failed for a reason other than a wrong password.
    #[error("Failed to verify password: {0}")]
    Verify(String),
}

impl PasswordError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Hash(_) => "PASSWORD_HASH_FAILED",
            Self::InvalidHash => "INVALID_PASSWORD_HASH",
            Self::Verify(_) => "PASSWORD_VERIFY_FAILED",
        }
    }
}

/// Hashes `password` with a fresh random salt and returns the PHC string.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| PasswordError::Hash(err.to_string()))
}

/// Checks `attempt` against a stored PHC string.
///
/// A wrong password is `Ok(false)`, not an error.
pub fn verify_password(attempt: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;
    match Argon2::default().verify_password(attempt.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(PasswordError::Verify(err.to_string())),
    }
}
