//! Password hashing
//!
//! Credentials are hashed deterministically so that sign-in can look a user up
//! with a single `(email, password_digest)` query. The hash is PBKDF2-HMAC-SHA256
//! keyed with a deployment-wide salt, which keeps digests from one deployment
//! useless against another and keeps brute force expensive.

use hmac::Hmac;
use sha2::Sha256;

/// Default PBKDF2 iteration count
const DEFAULT_ROUNDS: u32 = 100_000;

/// Length of the derived key in bytes (rendered as 64 hex chars)
const DIGEST_LEN: usize = 32;

/// Hashing errors
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("PASSWORD_SALT environment variable not set")]
    MissingSalt,

    #[error("Password hashing failed: {0}")]
    HashFailure(String),
}

/// One-way credential transform
///
/// Implementations must be deterministic for a given configuration: the same
/// plaintext always yields the same digest.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, HashError>;
}

/// PBKDF2 hasher configuration
#[derive(Clone)]
pub struct HasherConfig {
    /// Deployment-wide salt
    pub salt: String,
    /// PBKDF2 iteration count
    pub rounds: u32,
}

impl HasherConfig {
    pub fn new(salt: impl Into<String>) -> Self {
        Self {
            salt: salt.into(),
            rounds: DEFAULT_ROUNDS,
        }
    }

    /// Create config from environment variables
    pub fn from_env() -> Result<Self, HashError> {
        let salt = std::env::var("PASSWORD_SALT").map_err(|_| HashError::MissingSalt)?;
        Ok(Self::new(salt).with_env_overrides())
    }

    /// Apply `PASSWORD_HASH_ROUNDS` from the environment
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(rounds) = std::env::var("PASSWORD_HASH_ROUNDS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.rounds = rounds;
        }
        self
    }

    /// Set iteration count
    pub fn rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }
}

/// Deterministic PBKDF2-HMAC-SHA256 hasher
#[derive(Clone)]
pub struct Pbkdf2Hasher {
    config: HasherConfig,
}

impl Pbkdf2Hasher {
    pub fn new(config: HasherConfig) -> Self {
        Self { config }
    }
}

impl PasswordHasher for Pbkdf2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        if self.config.rounds == 0 {
            return Err(HashError::HashFailure(
                "iteration count must be positive".to_string(),
            ));
        }

        let mut digest = [0u8; DIGEST_LEN];
        pbkdf2::pbkdf2::<Hmac<Sha256>>(
            plaintext.as_bytes(),
            self.config.salt.as_bytes(),
            self.config.rounds,
            &mut digest,
        )
        .map_err(|e| HashError::HashFailure(e.to_string()))?;

        Ok(hex::encode(digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low round count keeps the suite fast; determinism does not depend on it.
    fn create_test_hasher(salt: &str) -> Pbkdf2Hasher {
        Pbkdf2Hasher::new(HasherConfig::new(salt).rounds(1_000))
    }

    #[test]
    fn test_hash_is_deterministic() {
        let hasher = create_test_hasher("salt");

        let first = hasher.hash("pw").unwrap();
        let second = hasher.hash("pw").unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_hash_is_64_hex_chars() {
        let hasher = create_test_hasher("salt");
        let digest = hasher.hash("pw").unwrap();

        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_differs_across_salts() {
        let a = create_test_hasher("deployment-a").hash("pw").unwrap();
        let b = create_test_hasher("deployment-b").hash("pw").unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_differs_across_passwords() {
        let hasher = create_test_hasher("salt");

        assert_ne!(hasher.hash("pw1").unwrap(), hasher.hash("pw2").unwrap());
    }

    #[test]
    fn test_hash_never_contains_plaintext() {
        let hasher = create_test_hasher("salt");
        let digest = hasher.hash("hunter2").unwrap();

        assert!(!digest.contains("hunter"));
    }

    #[test]
    fn test_hash_accepts_any_input() {
        let hasher = create_test_hasher("salt");

        assert!(hasher.hash("").is_ok());
        assert!(hasher.hash("пароль_密码_🔐").is_ok());
        assert!(hasher.hash(&"a".repeat(10_000)).is_ok());
    }

    #[test]
    fn test_zero_rounds_is_hash_failure() {
        let hasher = Pbkdf2Hasher::new(HasherConfig::new("salt").rounds(0));

        let result = hasher.hash("pw");
        assert!(matches!(result, Err(HashError::HashFailure(_))));
    }

    #[test]
    fn test_config_defaults() {
        let config = HasherConfig::new("s");
        assert_eq!(config.salt, "s");
        assert_eq!(config.rounds, DEFAULT_ROUNDS);
    }
}
