//! listkeeper - Multi-tenant task tracker backend
//!
//! Users own lists, lists own items. Every request to the list and item API is
//! authenticated with a short-lived access token, and every storage query is
//! scoped to the caller's ownership chain.

pub mod app;
pub mod core;
