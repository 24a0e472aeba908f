//! Authentication module for listkeeper
//!
//! This module provides authentication functionality including:
//! - Deterministic password hashing
//! - JWT access tokens and opaque refresh tokens
//! - Sign-up, sign-in and single-use refresh token rotation
//! - Access control middleware for the REST API

pub mod api;
pub mod hasher;
pub mod jwt;
pub mod middleware;
pub mod service;

pub use api::{ApiError, AuthApiState, auth_api_router};
pub use hasher::{HashError, HasherConfig, PasswordHasher, Pbkdf2Hasher};
pub use jwt::{Claims, JwtConfig, JwtError, JwtService, TokenPair};
pub use middleware::{AuthUser, log_request, require_auth};
pub use service::{AuthError, AuthService, SignInRequest, SignUpRequest};
