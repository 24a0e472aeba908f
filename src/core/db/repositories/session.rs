//! Session repository for refresh token management
//!
//! Each user has at most one refresh session. Tokens are stored as SHA-256
//! hashes; redemption is a single `DELETE ... RETURNING`, so a token can be
//! redeemed at most once even under concurrent requests.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::core::db::models::RefreshSession;

/// Session repository error types
#[derive(Debug, thiserror::Error)]
pub enum SessionRepositoryError {
    #[error("Session not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Hash a refresh token using SHA-256
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Persistence of the single live refresh session per user
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store `session`, replacing any session the same user already has
    async fn put_session(&self, session: &RefreshSession) -> Result<(), SessionRepositoryError>;

    /// Look up the session for the raw `token` and delete it in the same step.
    ///
    /// Expired sessions are still returned (and still deleted); the caller
    /// decides what expiry means.
    async fn redeem_session(&self, token: &str) -> Result<RefreshSession, SessionRepositoryError>;
}

/// PostgreSQL-backed session repository
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Clean up expired sessions
    pub async fn cleanup_expired(&self) -> Result<u64, SessionRepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_sessions
            WHERE expires_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn put_session(&self, session: &RefreshSession) -> Result<(), SessionRepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_sessions (id, user_id, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET id = EXCLUDED.id,
                token_hash = EXCLUDED.token_hash,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(&session.token_hash)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn redeem_session(&self, token: &str) -> Result<RefreshSession, SessionRepositoryError> {
        let token_hash = hash_token(token);

        sqlx::query_as::<_, RefreshSession>(
            r#"
            DELETE FROM refresh_sessions
            WHERE token_hash = $1
            RETURNING id, user_id, token_hash, expires_at
            "#,
        )
        .bind(&token_hash)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(SessionRepositoryError::NotFound)
    }
}
