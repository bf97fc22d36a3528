use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;

/// Length of generated access tokens and storage name identifiers.
pub const IDENTIFIER_LEN: usize = 100;

/// Thread-safe source of random identifiers.
///
/// Injected into the storage name generator and the session authenticator
/// so tests can substitute a predictable source.
pub trait RandomSource: Send + Sync {
    /// Returns `len` characters drawn from `[A-Za-z0-9]`.
    fn alphanumeric(&self, len: usize) -> String;
}

/// Operating system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn alphanumeric(&self, len: usize) -> String {
        OsRng
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphanumeric_has_requested_length() {
        // Act
        let s = OsRandom.alphanumeric(IDENTIFIER_LEN);

        // Assert
        assert_eq!(s.len(), IDENTIFIER_LEN);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn alphanumeric_differs_between_calls() {
        // Act
        let a = OsRandom.alphanumeric(IDENTIFIER_LEN);
        let b = OsRandom.alphanumeric(IDENTIFIER_LEN);

        // Assert
        assert_ne!(a, b);
    }
}
