//! Core domain: authentication, storage and the REST endpoints built on them

pub mod auth;
pub mod config;
pub mod db;
pub mod items;
pub mod lists;
