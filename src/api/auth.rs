//! Authentication API endpoints
//!
//! Login, logout, and current-user lookup. Login is rate limited per
//! email and per client IP before credentials are even checked.

use axum::{
    extract::{ConnectInfo, State},
    http::header,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::ApiResponse;
use crate::models::AdminUser;
use crate::services::AuthServiceError;

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response payload
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: String,
    pub user: AdminUser,
}

/// Routes that work without a session
pub fn public_router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Routes that require a session
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let ip = addr.ip();
    if state.rate_limiter.is_ip_limited(ip).await {
        return Err(ApiError::rate_limited("Too many login attempts"));
    }
    state.rate_limiter.record_ip_request(ip).await;

    if state.rate_limiter.is_email_limited(&body.email).await {
        return Err(ApiError::rate_limited(
            "Too many failed attempts for this account",
        ));
    }

    match state.auth_service.login(&body.email, &body.password).await {
        Ok((user, session)) => {
            state.rate_limiter.clear_email_attempts(&body.email).await;
            Ok(Json(ApiResponse::ok(LoginResponse {
                token: session.id,
                expires_at: session.expires_at.to_rfc3339(),
                user,
            })))
        }
        Err(AuthServiceError::InvalidCredentials) => {
            state.rate_limiter.record_failed_attempt(&body.email).await;
            Err(AuthServiceError::InvalidCredentials.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /api/auth/logout
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    _user: AuthenticatedUser,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if let Some(token) = bearer_token(&headers) {
        state.auth_service.logout(&token).await?;
    }
    Ok(Json(ApiResponse::ok(serde_json::json!({"logged_out": true}))))
}

/// GET /api/auth/me
async fn me(user: AuthenticatedUser) -> Json<ApiResponse<AdminUser>> {
    Json(ApiResponse::ok(user.0))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc-123"),
        );
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_bearer_token_missing_or_malformed() {
        assert!(bearer_token(&HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert!(bearer_token(&headers).is_none());
    }
}
