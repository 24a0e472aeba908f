//! Token issuance and validation
//!
//! Access tokens are HS256 JWTs carrying the user id as subject. Refresh tokens
//! are opaque: 32 bytes from the OS random source, hex encoded. Only the access
//! token is self-validating; refresh tokens are checked against the session store.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default access token lifetime (12 hours)
const ACCESS_TOKEN_TTL_MINUTES: i64 = 12 * 60;

/// Default refresh session lifetime (30 days)
const REFRESH_SESSION_TTL_DAYS: i64 = 30;

/// Upper bound for the access token lifetime (one year)
const MAX_ACCESS_TOKEN_TTL_MINUTES: i64 = 366 * 24 * 60;

/// Upper bound for the refresh session lifetime (ten years)
const MAX_REFRESH_SESSION_TTL_DAYS: i64 = 3660;

/// Number of random bytes in a refresh token
const REFRESH_TOKEN_BYTES: usize = 32;

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Access token lifetime in minutes
    pub access_token_ttl_minutes: i64,
    /// Refresh session lifetime in days
    pub refresh_session_ttl_days: i64,
    /// Token issuer
    pub issuer: String,
}

impl JwtConfig {
    /// Create a new JWT configuration
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_token_ttl_minutes: ACCESS_TOKEN_TTL_MINUTES,
            refresh_session_ttl_days: REFRESH_SESSION_TTL_DAYS,
            issuer: "listkeeper".to_string(),
        }
    }

    /// Create config from environment variables
    pub fn from_env() -> Result<Self, JwtError> {
        let secret = std::env::var("JWT_SECRET").map_err(|_| JwtError::MissingSecret)?;
        Ok(Self::new(secret).with_env_overrides())
    }

    /// Apply lifetime and issuer overrides from the environment
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(minutes) = std::env::var("JWT_ACCESS_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self = self.access_token_ttl(minutes);
        }

        if let Some(days) = std::env::var("JWT_REFRESH_TTL_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self = self.refresh_session_ttl(days);
        }

        if let Ok(issuer) = std::env::var("JWT_ISSUER") {
            self.issuer = issuer;
        }

        self
    }

    /// Set access token lifetime, clamped to one year either way
    pub fn access_token_ttl(mut self, minutes: i64) -> Self {
        self.access_token_ttl_minutes =
            minutes.clamp(-MAX_ACCESS_TOKEN_TTL_MINUTES, MAX_ACCESS_TOKEN_TTL_MINUTES);
        self
    }

    /// Set refresh session lifetime, clamped to ten years either way
    pub fn refresh_session_ttl(mut self, days: i64) -> Self {
        self.refresh_session_ttl_days =
            days.clamp(-MAX_REFRESH_SESSION_TTL_DAYS, MAX_REFRESH_SESSION_TTL_DAYS);
        self
    }

    /// Access token lifetime; the fields are public, so clamp again here
    fn access_ttl(&self) -> Duration {
        Duration::minutes(
            self.access_token_ttl_minutes
                .clamp(-MAX_ACCESS_TOKEN_TTL_MINUTES, MAX_ACCESS_TOKEN_TTL_MINUTES),
        )
    }

    fn refresh_ttl(&self) -> Duration {
        Duration::days(
            self.refresh_session_ttl_days
                .clamp(-MAX_REFRESH_SESSION_TTL_DAYS, MAX_REFRESH_SESSION_TTL_DAYS),
        )
    }

    /// Set issuer
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }
}

/// JWT errors
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT_SECRET environment variable not set")]
    MissingSecret,

    #[error("Token encoding failed: {0}")]
    EncodingError(String),

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Malformed token")]
    Malformed,
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName => JwtError::InvalidSignature,
            _ => JwtError::Malformed,
        }
    }
}

/// Access token claims. Never persisted.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    /// Get user ID as UUID
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::Malformed)
    }
}

/// Token pair (access + refresh)
#[derive(Debug, Clone)]
pub struct TokenPair {
    /// Access token (short-lived, signed)
    pub access_token: String,
    /// Refresh token (long-lived, opaque, single use)
    pub refresh_token: String,
    /// Access token expiration (Unix timestamp)
    pub access_expires_at: i64,
    /// Refresh session expiration (Unix timestamp)
    pub refresh_expires_at: i64,
}

/// Issues and validates tokens with a key injected at construction
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    /// Create a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issue a signed access token for `user_id`.
    ///
    /// Returns the token and its expiry as a Unix timestamp.
    pub fn issue_access_token(&self, user_id: Uuid) -> Result<(String, i64), JwtError> {
        let now = Utc::now();
        let exp = now + self.config.access_ttl();

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?;

        Ok((token, exp.timestamp()))
    }

    /// Issue an opaque refresh token: 32 CSPRNG bytes as 64 lowercase hex chars
    pub fn issue_refresh_token(&self) -> String {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Validate an access token and return its subject
    pub fn validate_access_token(&self, token: &str) -> Result<Uuid, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        // Strict expiration checking
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;

        // The library accepts exp == now; a zero-lifetime token must not validate.
        if token_data.claims.exp <= Utc::now().timestamp() {
            return Err(JwtError::Expired);
        }

        token_data.claims.user_id()
    }

    /// Expiry for a refresh session created now
    pub fn refresh_session_expiry(&self) -> DateTime<Utc> {
        Utc::now() + self.config.refresh_ttl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> JwtService {
        let config = JwtConfig::new("test_secret_key_for_testing_only_32bytes!");
        JwtService::new(config)
    }

    // ========================================================================
    // JwtConfig Tests
    // ========================================================================

    #[test]
    fn test_jwt_config_new() {
        let config = JwtConfig::new("my_secret");

        assert_eq!(config.secret, "my_secret");
        assert_eq!(config.access_token_ttl_minutes, ACCESS_TOKEN_TTL_MINUTES);
        assert_eq!(config.refresh_session_ttl_days, REFRESH_SESSION_TTL_DAYS);
        assert_eq!(config.issuer, "listkeeper");
    }

    #[test]
    fn test_jwt_config_builder() {
        let config = JwtConfig::new("secret")
            .access_token_ttl(30)
            .refresh_session_ttl(14)
            .issuer("my_app");

        assert_eq!(config.access_token_ttl_minutes, 30);
        assert_eq!(config.refresh_session_ttl_days, 14);
        assert_eq!(config.issuer, "my_app");
    }

    // ========================================================================
    // Access Token Tests
    // ========================================================================

    #[test]
    fn test_issue_and_validate_access_token() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();

        let (token, exp) = service.issue_access_token(user_id).unwrap();
        assert!(!token.is_empty());
        assert!(exp > Utc::now().timestamp());

        let subject = service.validate_access_token(&token).unwrap();
        assert_eq!(subject, user_id);
    }

    #[test]
    fn test_access_token_default_ttl_is_twelve_hours() {
        let service = create_test_service();
        let before = Utc::now().timestamp();

        let (_, exp) = service.issue_access_token(Uuid::new_v4()).unwrap();

        let ttl = exp - before;
        assert!((12 * 3600 - 1..=12 * 3600 + 1).contains(&ttl));
    }

    #[test]
    fn test_validate_token_wrong_secret() {
        let service1 = JwtService::new(JwtConfig::new("secret_one"));
        let service2 = JwtService::new(JwtConfig::new("secret_two"));

        let (token, _) = service1.issue_access_token(Uuid::new_v4()).unwrap();

        let result = service2.validate_access_token(&token);
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_validate_token_wrong_algorithm() {
        let service = create_test_service();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 3600,
            iss: "listkeeper".to_string(),
        };
        let key = EncodingKey::from_secret(b"test_secret_key_for_testing_only_32bytes!");
        let token = encode(&Header::new(Algorithm::HS512), &claims, &key).unwrap();

        let result = service.validate_access_token(&token);
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_validate_malformed_token() {
        let service = create_test_service();

        assert!(matches!(
            service.validate_access_token("invalid.token.here"),
            Err(JwtError::Malformed)
        ));
        assert!(matches!(
            service.validate_access_token(""),
            Err(JwtError::Malformed)
        ));
        assert!(matches!(
            service.validate_access_token("not-a-jwt"),
            Err(JwtError::Malformed)
        ));
    }

    #[test]
    fn test_validate_non_uuid_subject_is_malformed() {
        let service = create_test_service();
        let claims = Claims {
            sub: "42".to_string(),
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 3600,
            iss: "listkeeper".to_string(),
        };
        let key = EncodingKey::from_secret(b"test_secret_key_for_testing_only_32bytes!");
        let token = encode(&Header::new(Algorithm::HS256), &claims, &key).unwrap();

        let result = service.validate_access_token(&token);
        assert!(matches!(result, Err(JwtError::Malformed)));
    }

    #[test]
    fn test_expired_token() {
        let config = JwtConfig::new("test_secret").access_token_ttl(-1);
        let service = JwtService::new(config);

        let (token, _) = service.issue_access_token(Uuid::new_v4()).unwrap();

        let result = service.validate_access_token(&token);
        assert!(
            matches!(result, Err(JwtError::Expired)),
            "Expected Expired error, got: {:?}",
            result
        );
    }

    #[test]
    fn test_zero_ttl_token_is_expired() {
        let config = JwtConfig::new("test_secret").access_token_ttl(0);
        let service = JwtService::new(config);

        let (token, _) = service.issue_access_token(Uuid::new_v4()).unwrap();

        assert!(matches!(
            service.validate_access_token(&token),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_forged_expired_token_reports_signature_first() {
        let issuer = JwtService::new(JwtConfig::new("other").access_token_ttl(-1));
        let (token, _) = issuer.issue_access_token(Uuid::new_v4()).unwrap();

        let result = create_test_service().validate_access_token(&token);
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    // ========================================================================
    // Refresh Token Tests
    // ========================================================================

    #[test]
    fn test_refresh_token_is_64_hex_chars() {
        let service = create_test_service();
        let token = service.issue_refresh_token();

        assert_eq!(token.len(), 64);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let service = create_test_service();

        let tokens: std::collections::HashSet<String> =
            (0..100).map(|_| service.issue_refresh_token()).collect();

        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn test_refresh_session_expiry_uses_config() {
        let service = JwtService::new(JwtConfig::new("s").refresh_session_ttl(30));
        let expiry = service.refresh_session_expiry();

        let days = (expiry - Utc::now()).num_days();
        assert!((29..=30).contains(&days));
    }

    // ========================================================================
    // Error Tests
    // ========================================================================

    #[test]
    fn test_jwt_error_display() {
        assert_eq!(
            format!("{}", JwtError::MissingSecret),
            "JWT_SECRET environment variable not set"
        );
        assert_eq!(format!("{}", JwtError::Expired), "Token expired");
        assert_eq!(
            format!("{}", JwtError::InvalidSignature),
            "Invalid token signature"
        );
        assert_eq!(format!("{}", JwtError::Malformed), "Malformed token");
    }

    #[test]
    fn test_out_of_range_ttls_are_clamped() {
        let config = JwtConfig::new("s")
            .access_token_ttl(i64::MAX)
            .refresh_session_ttl(i64::MAX);
        assert_eq!(config.access_token_ttl_minutes, MAX_ACCESS_TOKEN_TTL_MINUTES);
        assert_eq!(config.refresh_session_ttl_days, MAX_REFRESH_SESSION_TTL_DAYS);

        let service = JwtService::new(config);
        let user_id = Uuid::new_v4();
        let (token, _) = service.issue_access_token(user_id).unwrap();
        assert_eq!(service.validate_access_token(&token).unwrap(), user_id);
        assert!(service.refresh_session_expiry() > Utc::now());
    }

    #[test]
    fn test_direct_field_overflow_does_not_panic() {
        let mut config = JwtConfig::new("s");
        config.access_token_ttl_minutes = i64::MIN;
        config.refresh_session_ttl_days = i64::MAX;
        let service = JwtService::new(config);

        let (token, _) = service.issue_access_token(Uuid::new_v4()).unwrap();
        assert!(matches!(
            service.validate_access_token(&token),
            Err(JwtError::Expired)
        ));
        service.refresh_session_expiry();
    }
}
