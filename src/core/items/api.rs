//! Item API endpoints
//!
//! - POST /api/lists/{id}/items - Create an item in a list
//! - GET /api/lists/{id}/items - All items of a list
//! - GET /api/items/{id} - Get item by ID
//! - PUT /api/items/{id} - Partial update
//! - DELETE /api/items/{id} - Delete item

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::auth::AuthUser;
use crate::core::db::models::{CreateTodoItem, TodoItem, UpdateTodoItem};
use crate::core::db::repositories::ItemStore;
use crate::core::lists::api::{CreatedResponse, StatusResponse, TodoApiError, require_title};

/// Item API state containing the item store
#[derive(Clone)]
pub struct ItemApiState {
    pub items: Arc<dyn ItemStore>,
}

/// Response for item collection
#[derive(Debug, Serialize)]
pub struct ItemCollectionResponse {
    pub data: Vec<TodoItem>,
}

/// Create the item API router
pub fn item_api_router(state: ItemApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route(
            "/api/lists/{id}/items",
            get(list_items_handler).post(create_item_handler),
        )
        .route(
            "/api/items/{id}",
            get(get_item_handler)
                .put(update_item_handler)
                .delete(delete_item_handler),
        )
        .with_state(state)
}

/// POST /api/lists/{id}/items
async fn create_item_handler(
    State(state): State<Arc<ItemApiState>>,
    AuthUser(user_id): AuthUser,
    Path(list_id): Path<Uuid>,
    Json(request): Json<CreateTodoItem>,
) -> Result<(StatusCode, Json<CreatedResponse>), TodoApiError> {
    require_title(&request.title)?;

    let id = state.items.create_item(user_id, list_id, &request).await?;

    tracing::info!("Item {} created in list {}", id, list_id);

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// GET /api/lists/{id}/items
async fn list_items_handler(
    State(state): State<Arc<ItemApiState>>,
    AuthUser(user_id): AuthUser,
    Path(list_id): Path<Uuid>,
) -> Result<Json<ItemCollectionResponse>, TodoApiError> {
    tracing::debug!("Listing items of list {} for user {}", list_id, user_id);

    let data = state.items.get_all_items(user_id, list_id).await?;

    Ok(Json(ItemCollectionResponse { data }))
}

/// GET /api/items/{id}
async fn get_item_handler(
    State(state): State<Arc<ItemApiState>>,
    AuthUser(user_id): AuthUser,
    Path(item_id): Path<Uuid>,
) -> Result<Json<TodoItem>, TodoApiError> {
    Ok(Json(state.items.get_item_by_id(user_id, item_id).await?))
}

/// PUT /api/items/{id}
async fn update_item_handler(
    State(state): State<Arc<ItemApiState>>,
    AuthUser(user_id): AuthUser,
    Path(item_id): Path<Uuid>,
    Json(request): Json<UpdateTodoItem>,
) -> Result<Json<TodoItem>, TodoApiError> {
    if let Some(title) = &request.title {
        require_title(title)?;
    }

    let item = state.items.update_item(user_id, item_id, &request).await?;

    Ok(Json(item))
}

/// DELETE /api/items/{id}
async fn delete_item_handler(
    State(state): State<Arc<ItemApiState>>,
    AuthUser(user_id): AuthUser,
    Path(item_id): Path<Uuid>,
) -> Result<Json<StatusResponse>, TodoApiError> {
    state.items.delete_item(user_id, item_id).await?;

    Ok(Json(StatusResponse::ok()))
}
