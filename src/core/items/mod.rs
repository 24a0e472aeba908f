//! Items module for listkeeper
//!
//! REST API endpoints for todo items, reachable only through a list the
//! caller owns.

pub mod api;

pub use api::{ItemApiState, item_api_router};
