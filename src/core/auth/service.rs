//! Authentication service
//!
//! Provides business logic for sign-up, sign-in, and refresh token rotation.
//! Coordinates between the credential store, session store, password hasher,
//! and JWT service.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::core::auth::hasher::{HashError, PasswordHasher};
use crate::core::auth::jwt::{JwtError, JwtService, TokenPair};
use crate::core::db::models::{CreateUser, RefreshSession};
use crate::core::db::repositories::{
    CredentialStore, SessionRepositoryError, SessionStore, UserRepositoryError, hash_token,
};

/// Authentication service error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session expired")]
    SessionExpired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Malformed token")]
    Malformed,

    #[error("Password hashing failed: {0}")]
    HashFailure(String),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Invalid request: {0}")]
    InvalidInput(String),
}

impl AuthError {
    /// Whether the error should be reported to the client as 401
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::SessionNotFound
                | AuthError::SessionExpired
                | AuthError::InvalidSignature
                | AuthError::Expired
                | AuthError::Malformed
        )
    }
}

impl From<UserRepositoryError> for AuthError {
    fn from(err: UserRepositoryError) -> Self {
        match err {
            UserRepositoryError::EmailAlreadyExists => AuthError::DuplicateEmail,
            UserRepositoryError::InvalidCredentials => AuthError::InvalidCredentials,
            UserRepositoryError::DatabaseError(e) => AuthError::PersistenceFailure(e.to_string()),
        }
    }
}

impl From<SessionRepositoryError> for AuthError {
    fn from(err: SessionRepositoryError) -> Self {
        match err {
            SessionRepositoryError::NotFound => AuthError::SessionNotFound,
            SessionRepositoryError::DatabaseError(e) => {
                AuthError::PersistenceFailure(e.to_string())
            }
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::InvalidSignature => AuthError::InvalidSignature,
            JwtError::Expired => AuthError::Expired,
            JwtError::Malformed => AuthError::Malformed,
            JwtError::MissingSecret | JwtError::EncodingError(_) => {
                AuthError::HashFailure(err.to_string())
            }
        }
    }
}

impl From<HashError> for AuthError {
    fn from(err: HashError) -> Self {
        AuthError::HashFailure(err.to_string())
    }
}

/// Sign-up request data
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Sign-in request data
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    hasher: Arc<dyn PasswordHasher>,
    jwt_service: JwtService,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        hasher: Arc<dyn PasswordHasher>,
        jwt_service: JwtService,
    ) -> Self {
        Self {
            credentials,
            sessions,
            hasher,
            jwt_service,
        }
    }

    /// Register a new user and return its id
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<Uuid, AuthError> {
        let password_digest = self.hasher.hash(&request.password)?;

        let user_id = self
            .credentials
            .create_user(&CreateUser {
                name: request.name,
                email: request.email,
                password_digest,
                registered_at: Utc::now(),
            })
            .await?;

        tracing::info!("Registered user {}", user_id);
        Ok(user_id)
    }

    /// Verify credentials and start a fresh session, replacing any previous one
    pub async fn sign_in(&self, request: SignInRequest) -> Result<TokenPair, AuthError> {
        let password_digest = self.hasher.hash(&request.password)?;

        let user_id = self
            .credentials
            .find_user_id_by_credential(&request.email, &password_digest)
            .await
            .inspect_err(|_| tracing::info!("Sign-in rejected"))?;

        let tokens = self.generate_token_pair(user_id).await?;

        tracing::info!("User {} signed in", user_id);
        Ok(tokens)
    }

    /// Redeem a refresh token for a new token pair.
    ///
    /// The old session is consumed before its expiry is checked, so an expired
    /// token is also gone after this call.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let session = self.sessions.redeem_session(refresh_token).await?;

        if session.is_expired(Utc::now()) {
            tracing::info!("Refresh session for user {} expired", session.user_id);
            return Err(AuthError::SessionExpired);
        }

        let tokens = self.generate_token_pair(session.user_id).await?;

        tracing::debug!("Rotated refresh session for user {}", session.user_id);
        Ok(tokens)
    }

    /// Validate an access token and return the user ID if valid
    pub fn validate_access_token(&self, token: &str) -> Result<Uuid, AuthError> {
        Ok(self.jwt_service.validate_access_token(token)?)
    }

    /// Issue both tokens and persist the refresh session.
    ///
    /// Nothing is returned unless the session write succeeds.
    async fn generate_token_pair(&self, user_id: Uuid) -> Result<TokenPair, AuthError> {
        let (access_token, access_expires_at) = self.jwt_service.issue_access_token(user_id)?;
        let refresh_token = self.jwt_service.issue_refresh_token();
        let expires_at = self.jwt_service.refresh_session_expiry();

        self.sessions
            .put_session(&RefreshSession {
                id: Uuid::new_v4(),
                user_id,
                token_hash: hash_token(&refresh_token),
                expires_at,
            })
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at: expires_at.timestamp(),
        })
    }
}
