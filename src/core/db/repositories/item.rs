//! Todo item repository
//!
//! Items are reached through `lists_items` and then `users_lists`; every query
//! carries the full item → list → user chain in its predicate.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::list::TodoRepositoryError;
use crate::core::db::models::{CreateTodoItem, TodoItem, UpdateTodoItem};

/// Owner-scoped item storage
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Insert the item into `list_id` if `user_id` owns that list
    async fn create_item(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        item: &CreateTodoItem,
    ) -> Result<Uuid, TodoRepositoryError>;

    async fn get_all_items(
        &self,
        user_id: Uuid,
        list_id: Uuid,
    ) -> Result<Vec<TodoItem>, TodoRepositoryError>;

    async fn get_item_by_id(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> Result<TodoItem, TodoRepositoryError>;

    async fn update_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        input: &UpdateTodoItem,
    ) -> Result<TodoItem, TodoRepositoryError>;

    async fn delete_item(&self, user_id: Uuid, item_id: Uuid) -> Result<(), TodoRepositoryError>;
}

/// PostgreSQL-backed item repository
#[derive(Clone)]
pub struct TodoItemRepository {
    pool: PgPool,
}

impl TodoItemRepository {
    /// Create a new item repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemStore for TodoItemRepository {
    async fn create_item(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        item: &CreateTodoItem,
    ) -> Result<Uuid, TodoRepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Lock the ownership link so the list cannot vanish before the item lands.
        sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT list_id FROM users_lists
            WHERE user_id = $1 AND list_id = $2
            FOR SHARE
            "#,
        )
        .bind(user_id)
        .bind(list_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(TodoRepositoryError::NotFound)?;

        let item_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO todo_items (title, description, done)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.done)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO lists_items (list_id, item_id) VALUES ($1, $2)")
            .bind(list_id)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(item_id)
    }

    async fn get_all_items(
        &self,
        user_id: Uuid,
        list_id: Uuid,
    ) -> Result<Vec<TodoItem>, TodoRepositoryError> {
        let owned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users_lists WHERE user_id = $1 AND list_id = $2)",
        )
        .bind(user_id)
        .bind(list_id)
        .fetch_one(&self.pool)
        .await?;

        if !owned {
            return Err(TodoRepositoryError::NotFound);
        }

        let items = sqlx::query_as::<_, TodoItem>(
            r#"
            SELECT ti.id, ti.title, ti.description, ti.done
            FROM todo_items ti
            JOIN lists_items li ON ti.id = li.item_id
            JOIN users_lists ul ON li.list_id = ul.list_id
            WHERE ul.user_id = $1 AND li.list_id = $2
            ORDER BY ti.title, ti.id
            "#,
        )
        .bind(user_id)
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn get_item_by_id(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> Result<TodoItem, TodoRepositoryError> {
        sqlx::query_as::<_, TodoItem>(
            r#"
            SELECT ti.id, ti.title, ti.description, ti.done
            FROM todo_items ti
            JOIN lists_items li ON ti.id = li.item_id
            JOIN users_lists ul ON li.list_id = ul.list_id
            WHERE ul.user_id = $1 AND ti.id = $2
            "#,
        )
        .bind(user_id)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(TodoRepositoryError::NotFound)
    }

    async fn update_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        input: &UpdateTodoItem,
    ) -> Result<TodoItem, TodoRepositoryError> {
        if input.is_empty() {
            return Err(TodoRepositoryError::EmptyUpdate);
        }

        sqlx::query_as::<_, TodoItem>(
            r#"
            UPDATE todo_items ti
            SET
                title = COALESCE($3, ti.title),
                description = COALESCE($4, ti.description),
                done = COALESCE($5, ti.done)
            FROM lists_items li, users_lists ul
            WHERE ti.id = li.item_id AND li.list_id = ul.list_id
            AND ul.user_id = $1 AND ti.id = $2
            RETURNING ti.id, ti.title, ti.description, ti.done
            "#,
        )
        .bind(user_id)
        .bind(item_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.done)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(TodoRepositoryError::NotFound)
    }

    async fn delete_item(&self, user_id: Uuid, item_id: Uuid) -> Result<(), TodoRepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM todo_items ti
            USING lists_items li, users_lists ul
            WHERE ti.id = li.item_id AND li.list_id = ul.list_id
            AND ul.user_id = $1 AND ti.id = $2
            "#,
        )
        .bind(user_id)
        .bind(item_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TodoRepositoryError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::models::CreateTodoList;
    use crate::core::db::repositories::{ListStore, TodoListRepository};

    async fn create_test_pool() -> PgPool {
        use crate::core::db::pool::{DbConfig, create_pool_with_migrations};

        let config = DbConfig::from_env().expect("DATABASE_URL must be set for tests");
        create_pool_with_migrations(&config)
            .await
            .expect("Failed to create test pool")
    }

    async fn setup_user_with_list(pool: &PgPool) -> (Uuid, Uuid) {
        let user_id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_digest)
            VALUES ($1, 'item test', $2, 'test_digest')
            "#,
        )
        .bind(user_id)
        .bind(format!("item_test_{}@example.com", user_id))
        .execute(pool)
        .await
        .expect("Failed to create test user");

        let list_id = TodoListRepository::new(pool.clone())
            .create_list(
                user_id,
                &CreateTodoList {
                    title: "list".to_string(),
                    description: None,
                },
            )
            .await
            .expect("Failed to create test list");

        (user_id, list_id)
    }

    async fn cleanup(pool: &PgPool, user_id: Uuid, list_id: Uuid) {
        TodoListRepository::new(pool.clone())
            .delete_list(user_id, list_id)
            .await
            .ok();
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(pool)
            .await
            .expect("Failed to cleanup test user");
    }

    fn new_item(title: &str) -> CreateTodoItem {
        CreateTodoItem {
            title: title.to_string(),
            description: None,
            done: false,
        }
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_create_item_in_foreign_list_fails() {
        let pool = create_test_pool().await;
        let (owner, list_id) = setup_user_with_list(&pool).await;
        let (intruder, other_list) = setup_user_with_list(&pool).await;
        let repo = TodoItemRepository::new(pool.clone());

        let result = repo.create_item(intruder, list_id, &new_item("x")).await;
        assert!(matches!(result, Err(TodoRepositoryError::NotFound)));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lists_items WHERE list_id = $1")
            .bind(list_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);

        cleanup(&pool, owner, list_id).await;
        cleanup(&pool, intruder, other_list).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_item_lifecycle() {
        let pool = create_test_pool().await;
        let (user_id, list_id) = setup_user_with_list(&pool).await;
        let repo = TodoItemRepository::new(pool.clone());

        let item_id = repo
            .create_item(user_id, list_id, &new_item("milk"))
            .await
            .unwrap();
        let item = repo.get_item_by_id(user_id, item_id).await.unwrap();
        assert!(!item.done);

        let update = UpdateTodoItem {
            done: Some(true),
            ..Default::default()
        };
        let item = repo.update_item(user_id, item_id, &update).await.unwrap();
        assert!(item.done);
        assert_eq!(item.title, "milk");

        assert_eq!(repo.get_all_items(user_id, list_id).await.unwrap().len(), 1);

        repo.delete_item(user_id, item_id).await.unwrap();
        assert!(matches!(
            repo.get_item_by_id(user_id, item_id).await,
            Err(TodoRepositoryError::NotFound)
        ));

        cleanup(&pool, user_id, list_id).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_foreign_item_is_not_found() {
        let pool = create_test_pool().await;
        let (owner, list_id) = setup_user_with_list(&pool).await;
        let (intruder, other_list) = setup_user_with_list(&pool).await;
        let repo = TodoItemRepository::new(pool.clone());

        let item_id = repo
            .create_item(owner, list_id, &new_item("secret"))
            .await
            .unwrap();

        assert!(matches!(
            repo.get_item_by_id(intruder, item_id).await,
            Err(TodoRepositoryError::NotFound)
        ));
        assert!(matches!(
            repo.delete_item(intruder, item_id).await,
            Err(TodoRepositoryError::NotFound)
        ));
        assert!(matches!(
            repo.get_all_items(intruder, list_id).await,
            Err(TodoRepositoryError::NotFound)
        ));
        assert!(repo.get_item_by_id(owner, item_id).await.is_ok());

        cleanup(&pool, owner, list_id).await;
        cleanup(&pool, intruder, other_list).await;
    }
}
