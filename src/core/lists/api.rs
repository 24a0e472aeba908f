//! List API endpoints
//!
//! Provides REST API endpoints for todo lists. All routes sit behind
//! [`crate::core::auth::require_auth`]:
//! - POST /api/lists - Create a list
//! - GET /api/lists - All lists of the caller
//! - GET /api/lists/{id} - Get list by ID
//! - PUT /api/lists/{id} - Partial update
//! - DELETE /api/lists/{id} - Delete list and its items

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::auth::{ApiError, AuthUser};
use crate::core::db::models::{CreateTodoList, TodoList, UpdateTodoList};
use crate::core::db::repositories::{ListStore, TodoRepositoryError};

/// List API state containing the list store
#[derive(Clone)]
pub struct ListApiState {
    pub lists: Arc<dyn ListStore>,
}

/// Errors shared by the list and item endpoints
#[derive(Debug, thiserror::Error)]
pub enum TodoApiError {
    #[error("Not found")]
    NotFound,

    #[error("Update has no fields")]
    EmptyUpdate,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<TodoRepositoryError> for TodoApiError {
    fn from(err: TodoRepositoryError) -> Self {
        match err {
            TodoRepositoryError::NotFound => TodoApiError::NotFound,
            TodoRepositoryError::EmptyUpdate => TodoApiError::EmptyUpdate,
            TodoRepositoryError::DatabaseError(e) => TodoApiError::InternalError(e.to_string()),
        }
    }
}

impl IntoResponse for TodoApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            TodoApiError::NotFound => (
                StatusCode::NOT_FOUND,
                ApiError::new(self.to_string(), "NOT_FOUND"),
            ),
            TodoApiError::EmptyUpdate => (
                StatusCode::BAD_REQUEST,
                ApiError::new(self.to_string(), "EMPTY_UPDATE"),
            ),
            TodoApiError::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                ApiError::new(self.to_string(), "BAD_REQUEST"),
            ),
            TodoApiError::InternalError(_) => {
                tracing::error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new("Internal server error", "INTERNAL_ERROR"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Reject blank titles on create
pub(crate) fn require_title(title: &str) -> Result<(), TodoApiError> {
    if title.trim().is_empty() {
        return Err(TodoApiError::BadRequest("title cannot be empty".to_string()));
    }
    Ok(())
}

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Response for create operations
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}

/// Response for list collection
#[derive(Debug, Serialize)]
pub struct ListCollectionResponse {
    pub data: Vec<TodoList>,
}

/// Response for delete and other bodiless operations
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the list API router
pub fn list_api_router(state: ListApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route(
            "/api/lists",
            get(list_lists_handler).post(create_list_handler),
        )
        .route(
            "/api/lists/{id}",
            get(get_list_handler)
                .put(update_list_handler)
                .delete(delete_list_handler),
        )
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/lists
async fn create_list_handler(
    State(state): State<Arc<ListApiState>>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<CreateTodoList>,
) -> Result<(StatusCode, Json<CreatedResponse>), TodoApiError> {
    require_title(&request.title)?;

    let id = state.lists.create_list(user_id, &request).await?;

    tracing::info!("List {} created for user {}", id, user_id);

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// GET /api/lists
async fn list_lists_handler(
    State(state): State<Arc<ListApiState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ListCollectionResponse>, TodoApiError> {
    tracing::debug!("Listing lists for user {}", user_id);

    let data = state.lists.get_all_lists(user_id).await?;

    Ok(Json(ListCollectionResponse { data }))
}

/// GET /api/lists/{id}
async fn get_list_handler(
    State(state): State<Arc<ListApiState>>,
    AuthUser(user_id): AuthUser,
    Path(list_id): Path<Uuid>,
) -> Result<Json<TodoList>, TodoApiError> {
    let list = state.lists.get_list_by_id(user_id, list_id).await?;

    Ok(Json(list))
}

/// PUT /api/lists/{id}
async fn update_list_handler(
    State(state): State<Arc<ListApiState>>,
    AuthUser(user_id): AuthUser,
    Path(list_id): Path<Uuid>,
    Json(request): Json<UpdateTodoList>,
) -> Result<Json<TodoList>, TodoApiError> {
    if let Some(title) = &request.title {
        require_title(title)?;
    }

    let list = state.lists.update_list(user_id, list_id, &request).await?;

    Ok(Json(list))
}

/// DELETE /api/lists/{id}
async fn delete_list_handler(
    State(state): State<Arc<ListApiState>>,
    AuthUser(user_id): AuthUser,
    Path(list_id): Path<Uuid>,
) -> Result<Json<StatusResponse>, TodoApiError> {
    state.lists.delete_list(user_id, list_id).await?;

    tracing::info!("List {} deleted by user {}", list_id, user_id);

    Ok(Json(StatusResponse::ok()))
}
