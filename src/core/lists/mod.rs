//! Lists module for listkeeper
//!
//! REST API endpoints for owner-scoped todo lists.

pub mod api;

pub use api::{ListApiState, TodoApiError, list_api_router};
