//! User repository for credential storage
//!
//! Users are looked up by the `(email, password_digest)` pair in a single query.
//! A miss never says which half was wrong.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::CreateUser;

/// User repository error types
#[derive(Debug, thiserror::Error)]
pub enum UserRepositoryError {
    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Persistence of users and verification of credential pairs
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a user and return the server-assigned id
    async fn create_user(&self, user: &CreateUser) -> Result<Uuid, UserRepositoryError>;

    /// Resolve the user id owning `email` with exactly this `digest`
    async fn find_user_id_by_credential(
        &self,
        email: &str,
        digest: &str,
    ) -> Result<Uuid, UserRepositoryError>;
}

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for UserRepository {
    async fn create_user(&self, user: &CreateUser) -> Result<Uuid, UserRepositoryError> {
        // The unique constraint is the source of truth; a pre-check would race.
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (name, email, password_digest, registered_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_digest)
        .bind(user.registered_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                UserRepositoryError::EmailAlreadyExists
            }
            other => UserRepositoryError::DatabaseError(other),
        })?;

        Ok(id)
    }

    async fn find_user_id_by_credential(
        &self,
        email: &str,
        digest: &str,
    ) -> Result<Uuid, UserRepositoryError> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM users
            WHERE email = $1 AND password_digest = $2
            "#,
        )
        .bind(email)
        .bind(digest)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(UserRepositoryError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::models::User;
    use chrono::Utc;

    #[test]
    fn test_user_repository_error_display() {
        assert_eq!(
            format!("{}", UserRepositoryError::EmailAlreadyExists),
            "Email already exists"
        );
        assert_eq!(
            format!("{}", UserRepositoryError::InvalidCredentials),
            "Invalid credentials"
        );
    }

    // ========================================================================
    // Integration Tests (require database)
    // ========================================================================

    async fn create_test_pool() -> PgPool {
        use crate::core::db::pool::{DbConfig, create_pool_with_migrations};

        let config = DbConfig::from_env().expect("DATABASE_URL must be set for tests");
        create_pool_with_migrations(&config)
            .await
            .expect("Failed to create test pool")
    }

    fn test_user(email: &str) -> CreateUser {
        CreateUser {
            name: "Test".to_string(),
            email: email.to_string(),
            password_digest: "digest".to_string(),
            registered_at: Utc::now(),
        }
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_create_and_find_by_credential() {
        let pool = create_test_pool().await;
        let repo = UserRepository::new(pool.clone());
        let email = format!("user_{}@example.com", Uuid::new_v4());

        let id = repo.create_user(&test_user(&email)).await.unwrap();
        let found = repo
            .find_user_id_by_credential(&email, "digest")
            .await
            .unwrap();
        assert_eq!(found, id);

        let stored: User = sqlx::query_as(
            "SELECT id, name, email, password_digest, registered_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(stored.email, email);
        assert_eq!(stored.password_digest, "digest");

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_duplicate_email() {
        let pool = create_test_pool().await;
        let repo = UserRepository::new(pool.clone());
        let email = format!("dup_{}@example.com", Uuid::new_v4());

        let id = repo.create_user(&test_user(&email)).await.unwrap();
        let result = repo.create_user(&test_user(&email)).await;
        assert!(matches!(result, Err(UserRepositoryError::EmailAlreadyExists)));

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_wrong_digest_and_unknown_email_look_the_same() {
        let pool = create_test_pool().await;
        let repo = UserRepository::new(pool.clone());
        let email = format!("cred_{}@example.com", Uuid::new_v4());

        let id = repo.create_user(&test_user(&email)).await.unwrap();

        let wrong_digest = repo.find_user_id_by_credential(&email, "other").await;
        let unknown_email = repo
            .find_user_id_by_credential("nobody@example.com", "digest")
            .await;
        assert!(matches!(
            wrong_digest,
            Err(UserRepositoryError::InvalidCredentials)
        ));
        assert!(matches!(
            unknown_email,
            Err(UserRepositoryError::InvalidCredentials)
        ));

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();
    }
}
