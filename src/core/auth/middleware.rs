//! Access control middleware
//!
//! `require_auth` validates the bearer token and stores the caller's identity
//! in the request extensions; handlers read it back with the [`AuthUser`]
//! extractor. Nothing downstream ever sees an unauthenticated request.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::core::auth::{AuthError, AuthService};

/// Authenticated caller, inserted by [`require_auth`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(AuthError::Malformed)
    }
}

/// Reject requests without a valid access token
pub async fn require_auth(
    State(auth_service): State<AuthService>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_bearer_token(req.headers())?;

    let user_id = auth_service
        .validate_access_token(token)
        .inspect_err(|e| tracing::warn!("Rejected access token: {}", e))?;

    req.extensions_mut().insert(AuthUser(user_id));

    Ok(next.run(req).await)
}

/// Log method and URI of every request
pub async fn log_request(req: Request, next: Next) -> Response {
    tracing::info!("{} {}", req.method(), req.uri());
    next.run(req).await
}

/// Extract Bearer token from Authorization header
pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::Malformed)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::Malformed)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::Malformed);
    }

    Ok(token)
}
