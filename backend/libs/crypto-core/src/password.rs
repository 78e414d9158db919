/// Password hashing and verification using Argon2id
use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("failed to hash password")]
    Hash,

    #[error("stored password hash is malformed")]
    MalformedHash,

    #[error("password does not match")]
    Mismatch,
}

/// Hash a password using Argon2id.
/// Returns a PHC string suitable for storage in the database.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(rand::thread_rng());

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordError::Hash)
}

/// Verify a password against a stored hash
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::MalformedHash)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| PasswordError::Mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("password1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("password1", &hash).is_ok());
    }

    #[test]
    fn test_wrong_password() {
        let hash = hash_password("password1").unwrap();
        assert_eq!(
            verify_password("password2", &hash),
            Err(PasswordError::Mismatch)
        );
    }

    #[test]
    fn test_salts_differ() {
        let first = hash_password("password1").unwrap();
        let second = hash_password("password1").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_hash() {
        assert_eq!(
            verify_password("password1", "not-a-phc-string"),
            Err(PasswordError::MalformedHash)
        );
    }
}
