//! HTTP application assembly
//!
//! Builds the axum router from the storage backends: the auth endpoints are
//! public, everything under `/api` goes through [`require_auth`].

use axum::{
    Json, Router,
    extract::State,
    http::{Method, StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::core::auth::{
    AuthApiState, AuthService, JwtService, PasswordHasher, auth_api_router, log_request,
    require_auth,
};
use crate::core::db::{
    ItemStore, ListStore, MemoryStore, PgPool, SessionRepository, TodoItemRepository,
    TodoListRepository, UserRepository, pool::health_check,
};
use crate::core::items::{ItemApiState, item_api_router};
use crate::core::lists::{ListApiState, list_api_router};

/// Everything the router needs, independent of the storage backend
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub lists: Arc<dyn ListStore>,
    pub items: Arc<dyn ItemStore>,
    /// Present when running on PostgreSQL; used by the health check
    pub pool: Option<PgPool>,
    pub request_timeout: Duration,
}

impl AppState {
    /// State backed by PostgreSQL repositories
    pub fn postgres(pool: PgPool, hasher: Arc<dyn PasswordHasher>, jwt: JwtService) -> Self {
        let auth_service = AuthService::new(
            Arc::new(UserRepository::new(pool.clone())),
            Arc::new(SessionRepository::new(pool.clone())),
            hasher,
            jwt,
        );

        Self {
            auth_service,
            lists: Arc::new(TodoListRepository::new(pool.clone())),
            items: Arc::new(TodoItemRepository::new(pool.clone())),
            pool: Some(pool),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// State backed by a single in-memory store
    pub fn in_memory(store: MemoryStore, hasher: Arc<dyn PasswordHasher>, jwt: JwtService) -> Self {
        let auth_service = AuthService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            hasher,
            jwt,
        );

        Self {
            auth_service,
            lists: Arc::new(store.clone()),
            items: Arc::new(store),
            pool: None,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Set the whole-request deadline
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Build the application router
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(list_api_router(ListApiState {
            lists: state.lists.clone(),
        }))
        .merge(item_api_router(ItemApiState {
            items: state.items.clone(),
        }))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            require_auth,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler).with_state(state.pool.clone()))
        .merge(auth_api_router(AuthApiState {
            auth_service: state.auth_service.clone(),
        }))
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(log_request))
                .layer(cors)
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    state.request_timeout,
                )),
        )
}

/// GET /health
async fn health_handler(State(pool): State<Option<PgPool>>) -> impl IntoResponse {
    let Some(pool) = pool else {
        return (StatusCode::OK, Json(json!({ "status": "ok", "storage": "memory" })));
    };

    match health_check(&pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "storage": "postgres" })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "storage": "postgres" })),
            )
        }
    }
}
