//! Auth API endpoints
//!
//! Provides REST API endpoints for authentication:
//! - POST /auth/sign-up - Register a new user
//! - POST /auth/sign-in - Get an access token and a refresh cookie
//! - POST /auth/refresh - Rotate the refresh token

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::auth::{AuthError, AuthService, SignInRequest, SignUpRequest, TokenPair};

/// Name of the cookie carrying the refresh token
pub const REFRESH_COOKIE: &str = "refresh-token";

/// Auth API state containing the auth service
#[derive(Clone)]
pub struct AuthApiState {
    pub auth_service: AuthService,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Convert AuthError to API response.
///
/// Every credential and token failure renders the same body.
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, body) = if self.is_unauthorized() {
            (
                StatusCode::UNAUTHORIZED,
                ApiError::new("Unauthorized", "UNAUTHORIZED"),
            )
        } else {
            match &self {
                AuthError::DuplicateEmail => (
                    StatusCode::BAD_REQUEST,
                    ApiError::new(self.to_string(), "EMAIL_EXISTS"),
                ),
                AuthError::InvalidInput(_) => (
                    StatusCode::BAD_REQUEST,
                    ApiError::new(self.to_string(), "BAD_REQUEST"),
                ),
                _ => {
                    tracing::error!("Auth failure: {}", self);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::new("Internal server error", "INTERNAL_ERROR"),
                    )
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Response for sign-up
#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub id: Uuid,
}

/// Response for sign-in and refresh; the refresh token travels in a cookie
#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Token refresh request for clients that do not keep cookies
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Create the auth API router
pub fn auth_api_router(state: AuthApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/auth/sign-up", post(sign_up_handler))
        .route("/auth/sign-in", post(sign_in_handler))
        .route("/auth/refresh", post(refresh_handler))
        .with_state(state)
}

/// POST /auth/sign-up
async fn sign_up_handler(
    State(state): State<Arc<AuthApiState>>,
    Json(request): Json<SignUpRequest>,
) -> Result<Json<SignUpResponse>, AuthError> {
    tracing::info!("Sign-up attempt");

    require_fields(&[
        ("name", request.name.as_str()),
        ("email", request.email.as_str()),
        ("password", request.password.as_str()),
    ])?;

    let id = state.auth_service.sign_up(request).await?;

    Ok(Json(SignUpResponse { id }))
}

/// POST /auth/sign-in
async fn sign_in_handler(
    State(state): State<Arc<AuthApiState>>,
    jar: CookieJar,
    Json(request): Json<SignInRequest>,
) -> Result<(CookieJar, Json<AccessTokenResponse>), AuthError> {
    require_fields(&[("email", request.email.as_str()), ("password", request.password.as_str())])?;

    let tokens = state.auth_service.sign_in(request).await?;

    Ok(with_refresh_cookie(jar, tokens))
}

/// POST /auth/refresh
/// The cookie wins; a JSON body with `refresh_token` is the fallback.
async fn refresh_handler(
    State(state): State<Arc<AuthApiState>>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, Json<AccessTokenResponse>), AuthError> {
    tracing::debug!("Token refresh request");

    let refresh_token = match jar.get(REFRESH_COOKIE) {
        Some(cookie) => cookie.value().to_string(),
        None => {
            serde_json::from_slice::<RefreshRequest>(&body)
                .map_err(|_| AuthError::SessionNotFound)?
                .refresh_token
        }
    };

    let tokens = state.auth_service.refresh_token(&refresh_token).await?;

    Ok(with_refresh_cookie(jar, tokens))
}

/// Reject blank credential fields before they reach the service
fn require_fields(fields: &[(&str, &str)]) -> Result<(), AuthError> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => Err(AuthError::InvalidInput(format!("{name} must not be blank"))),
        None => Ok(()),
    }
}

fn with_refresh_cookie(jar: CookieJar, tokens: TokenPair) -> (CookieJar, Json<AccessTokenResponse>) {
    let cookie = Cookie::build((REFRESH_COOKIE, tokens.refresh_token))
        .path("/auth")
        .http_only(true)
        .same_site(SameSite::Strict);

    (
        jar.add(cookie),
        Json(AccessTokenResponse {
            access_token: tokens.access_token,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_unauthorized_errors_share_one_body() {
        let mut bodies = Vec::new();
        for err in [
            AuthError::InvalidCredentials,
            AuthError::SessionNotFound,
            AuthError::SessionExpired,
            AuthError::InvalidSignature,
            AuthError::Expired,
            AuthError::Malformed,
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            bodies.push(body_json(response).await);
        }

        assert!(bodies.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(bodies[0]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_bad_request() {
        let response = AuthError::DuplicateEmail.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "EMAIL_EXISTS");
    }

    #[tokio::test]
    async fn test_blank_fields_are_bad_request() {
        let err = require_fields(&[("email", "a@b.c"), ("password", "  ")]).unwrap_err();
        assert!(!err.is_unauthorized());

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(body["error"].as_str().unwrap().contains("password"));

        assert!(require_fields(&[("email", "a@b.c"), ("password", "pw")]).is_ok());
    }

    #[tokio::test]
    async fn test_internal_errors_hide_details() {
        let response = AuthError::PersistenceFailure("connection reset".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert!(!body["error"].as_str().unwrap().contains("connection reset"));

        let response = AuthError::HashFailure("bad rounds".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_refresh_cookie_is_http_only() {
        let tokens = TokenPair {
            access_token: "access123".to_string(),
            refresh_token: "refresh456".to_string(),
            access_expires_at: 123456789,
            refresh_expires_at: 987654321,
        };

        let (jar, Json(body)) = with_refresh_cookie(CookieJar::new(), tokens);
        let cookie = jar.get(REFRESH_COOKIE).unwrap();

        assert_eq!(cookie.value(), "refresh456");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(body.access_token, "access123");
    }

    #[test]
    fn test_refresh_request_deserialization() {
        let request: RefreshRequest =
            serde_json::from_str(r#"{"refresh_token": "abc123"}"#).unwrap();
        assert_eq!(request.refresh_token, "abc123");
    }
}
