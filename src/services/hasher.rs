//! Password hashing behind a trait seam.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};

/// Failures a credential backend can report beyond a plain mismatch.
///
/// `Locked` exists because some backends refuse verification outright
/// after repeated failures; the authenticator maps it to its own
/// account-locked error rather than treating it as a bad password.
#[derive(Debug, thiserror::Error)]
pub enum HasherError {
    #[error("credential backend refused: account locked")]
    Locked,

    #[error("credential backend error: {0}")]
    Backend(String),
}

/// One-way credential hashing.
///
/// `verify` distinguishes "wrong password" (`Ok(false)`) from backend
/// failure, so callers can keep their error taxonomy honest.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, HasherError>;

    fn verify(&self, password: &str, hash: &str) -> Result<bool, HasherError>;
}

/// Argon2id hasher with the crate's default parameters.
#[derive(Default)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, HasherError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| HasherError::Backend(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, HasherError> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| HasherError::Backend(e.to_string()))?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HasherError::Backend(e.to_string())),
        }
    }
}
