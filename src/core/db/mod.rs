//! Database module for listkeeper
//!
//! This module provides database connectivity, models, and repositories
//! for persistent storage using PostgreSQL and SQLx, plus an in-memory
//! backend implementing the same storage traits.

pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used items
pub use memory::MemoryStore;
pub use models::*;
pub use pool::{DbConfig, DbError, create_pool, create_pool_with_migrations};
pub use repositories::{
    CredentialStore, ItemStore, ListStore, SessionRepository, SessionRepositoryError,
    SessionStore, TodoItemRepository, TodoListRepository, TodoRepositoryError, UserRepository,
    UserRepositoryError,
};

// Re-export sqlx types that might be needed
pub use sqlx::PgPool;
