//! Database models for listkeeper
//!
//! This module defines the entity structs that map to PostgreSQL tables, plus the
//! input DTOs accepted by the repositories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================================================
// User Model
// ============================================================================

/// User entity representing a registered user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_digest: String,
    pub registered_at: DateTime<Utc>,
}

/// User data for creation. `password_digest` is already hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_digest: String,
    pub registered_at: DateTime<Utc>,
}

// ============================================================================
// Refresh Session Model
// ============================================================================

/// Refresh session entity. At most one row exists per user.
///
/// Only the SHA-256 hash of the refresh token is stored; the raw token is
/// handed to the client once and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl RefreshSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

// ============================================================================
// Todo List Model
// ============================================================================

/// Todo list entity. Reachable only through its `users_lists` link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TodoList {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
}

/// List data for creation
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTodoList {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// List data for partial updates. Absent fields are left untouched.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateTodoList {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl UpdateTodoList {
    /// True when the update carries no fields at all
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

// ============================================================================
// Todo Item Model
// ============================================================================

/// Todo item entity. Reachable only through `lists_items` and its list's owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TodoItem {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub done: bool,
}

/// Item data for creation
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTodoItem {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub done: bool,
}

/// Item data for partial updates
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateTodoItem {
    pub title: Option<String>,
    pub description: Option<String>,
    pub done: Option<bool>,
}

impl UpdateTodoItem {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.done.is_none()
    }
}
