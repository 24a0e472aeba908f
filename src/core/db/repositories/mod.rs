//! Database repositories for listkeeper
//!
//! Each storage concern is a trait (`CredentialStore`, `SessionStore`,
//! `ListStore`, `ItemStore`) with a PostgreSQL implementation here and an
//! in-memory one in [`crate::core::db::memory`].

pub mod item;
pub mod list;
pub mod session;
pub mod user;

pub use item::{ItemStore, TodoItemRepository};
pub use list::{ListStore, TodoListRepository, TodoRepositoryError};
pub use session::{SessionRepository, SessionRepositoryError, SessionStore, hash_token};
pub use user::{CredentialStore, UserRepository, UserRepositoryError};
