//! Todo list repository
//!
//! Every query joins through `users_lists` and filters on the caller's user id.
//! A list that exists but belongs to someone else is indistinguishable from one
//! that does not exist.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::{CreateTodoList, TodoList, UpdateTodoList};

/// Errors shared by the list and item repositories
#[derive(Debug, thiserror::Error)]
pub enum TodoRepositoryError {
    #[error("Not found")]
    NotFound,

    #[error("Update has no fields")]
    EmptyUpdate,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Owner-scoped list storage
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Insert the list and its ownership link as one unit
    async fn create_list(
        &self,
        user_id: Uuid,
        list: &CreateTodoList,
    ) -> Result<Uuid, TodoRepositoryError>;

    async fn get_all_lists(&self, user_id: Uuid) -> Result<Vec<TodoList>, TodoRepositoryError>;

    async fn get_list_by_id(
        &self,
        user_id: Uuid,
        list_id: Uuid,
    ) -> Result<TodoList, TodoRepositoryError>;

    /// Apply only the fields present in `input`
    async fn update_list(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        input: &UpdateTodoList,
    ) -> Result<TodoList, TodoRepositoryError>;

    /// Delete the list together with all of its items
    async fn delete_list(&self, user_id: Uuid, list_id: Uuid) -> Result<(), TodoRepositoryError>;
}

/// PostgreSQL-backed list repository
#[derive(Clone)]
pub struct TodoListRepository {
    pool: PgPool,
}

impl TodoListRepository {
    /// Create a new list repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListStore for TodoListRepository {
    async fn create_list(
        &self,
        user_id: Uuid,
        list: &CreateTodoList,
    ) -> Result<Uuid, TodoRepositoryError> {
        // Dropping the transaction on an early return rolls it back.
        let mut tx = self.pool.begin().await?;

        let list_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO todo_lists (title, description)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(&list.title)
        .bind(&list.description)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO users_lists (user_id, list_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(list_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(list_id)
    }

    async fn get_all_lists(&self, user_id: Uuid) -> Result<Vec<TodoList>, TodoRepositoryError> {
        let lists = sqlx::query_as::<_, TodoList>(
            r#"
            SELECT tl.id, tl.title, tl.description
            FROM todo_lists tl
            JOIN users_lists ul ON tl.id = ul.list_id
            WHERE ul.user_id = $1
            ORDER BY tl.title, tl.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lists)
    }

    async fn get_list_by_id(
        &self,
        user_id: Uuid,
        list_id: Uuid,
    ) -> Result<TodoList, TodoRepositoryError> {
        sqlx::query_as::<_, TodoList>(
            r#"
            SELECT tl.id, tl.title, tl.description
            FROM todo_lists tl
            JOIN users_lists ul ON tl.id = ul.list_id
            WHERE ul.user_id = $1 AND ul.list_id = $2
            "#,
        )
        .bind(user_id)
        .bind(list_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(TodoRepositoryError::NotFound)
    }

    async fn update_list(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        input: &UpdateTodoList,
    ) -> Result<TodoList, TodoRepositoryError> {
        if input.is_empty() {
            return Err(TodoRepositoryError::EmptyUpdate);
        }

        sqlx::query_as::<_, TodoList>(
            r#"
            UPDATE todo_lists tl
            SET
                title = COALESCE($3, tl.title),
                description = COALESCE($4, tl.description)
            FROM users_lists ul
            WHERE tl.id = ul.list_id AND ul.user_id = $1 AND ul.list_id = $2
            RETURNING tl.id, tl.title, tl.description
            "#,
        )
        .bind(user_id)
        .bind(list_id)
        .bind(&input.title)
        .bind(&input.description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(TodoRepositoryError::NotFound)
    }

    async fn delete_list(&self, user_id: Uuid, list_id: Uuid) -> Result<(), TodoRepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Items first: deleting the list cascades only the link rows.
        sqlx::query(
            r#"
            DELETE FROM todo_items ti
            USING lists_items li, users_lists ul
            WHERE ti.id = li.item_id AND li.list_id = ul.list_id
            AND ul.user_id = $1 AND ul.list_id = $2
            "#,
        )
        .bind(user_id)
        .bind(list_id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            r#"
            DELETE FROM todo_lists tl
            USING users_lists ul
            WHERE tl.id = ul.list_id AND ul.user_id = $1 AND ul.list_id = $2
            "#,
        )
        .bind(user_id)
        .bind(list_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TodoRepositoryError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }
}
