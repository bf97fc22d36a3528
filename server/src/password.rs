//! Password hashing capability used by account registration and login.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordVerifier, SaltString};
use argon2::Argon2;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct HashError(String);

/// Hashes and verifies plaintext passwords.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, HashError>;

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError>;
}

/// Argon2id with a random salt, stored as a PHC string.
#[derive(Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        use argon2::password_hash::PasswordHasher as _;

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| HashError(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(hash).map_err(|e| HashError(e.to_string()))?;
        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        // Arrange
        let hasher = Argon2Hasher::default();

        // Act
        let hash = hasher.hash("pw1").unwrap();

        // Assert
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("pw1", &hash).unwrap());
        assert!(!hasher.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn same_password_different_salts() {
        // Arrange
        let hasher = Argon2Hasher::default();

        // Act
        let first = hasher.hash("pw").unwrap();
        let second = hasher.hash("pw").unwrap();

        // Assert
        assert_ne!(first, second);
    }

    #[test]
    fn verify_malformed_hash() {
        // Arrange
        let hasher = Argon2Hasher::default();

        // Act
        let result = hasher.verify("pw", "not a phc string");

        // Assert
        assert!(result.is_err());
    }
}
