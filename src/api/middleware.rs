//! API middleware
//!
//! Authentication middleware, the shared application state, the API error
//! type, and lightweight request statistics for the dashboard.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::models::AdminUser;
use crate::services::{
    AuthService, AuthServiceError, LoginRateLimiter, NewsService, PostService, VoiceService,
};

// ============================================================================
// Request Statistics
// ============================================================================

/// Lightweight request statistics using atomic operations (no locks)
pub struct RequestStats {
    total_requests: AtomicU64,
    total_response_time_us: AtomicU64,
    start_time: Instant,
}

impl RequestStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            total_response_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a request with its response time
    pub fn record(&self, duration_us: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_us
            .fetch_add(duration_us, Ordering::Relaxed);
    }

    /// Get total request count
    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Get average response time in microseconds
    pub fn avg_response_time_us(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        let total_time = self.total_response_time_us.load(Ordering::Relaxed);
        total_time as f64 / total as f64
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: crate::db::DynDatabasePool,
    pub auth_service: Arc<AuthService>,
    pub post_service: Arc<PostService>,
    pub voice_service: Arc<VoiceService>,
    pub news_service: Arc<NewsService>,
    pub rate_limiter: Arc<LoginRateLimiter>,
    pub upload_config: Arc<crate::config::UploadConfig>,
    pub request_stats: Arc<RequestStats>,
}

/// Authenticated admin extracted from request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub AdminUser);

impl AuthenticatedUser {
    /// Fail with 403 unless the admin holds the permission (exact match)
    pub fn require_permission(&self, permission: &str) -> Result<(), ApiError> {
        if self.0.has_permission(permission) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "Missing permission: {}",
                permission
            )))
        }
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Error response for API errors.
///
/// Serialized as `{ "success": false, "error": { "code", "message" } }` so
/// the admin frontend can inspect the envelope and the code uniformly.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub success: bool,
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new("RATE_LIMITED", message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new("BAD_GATEWAY", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "RATE_LIMITED" => StatusCode::TOO_MANY_REQUESTS,
            "BAD_GATEWAY" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<AuthServiceError> for ApiError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::InvalidCredentials => ApiError::unauthorized(err.to_string()),
            AuthServiceError::AccountDisabled => ApiError::forbidden(err.to_string()),
            AuthServiceError::SessionExpired | AuthServiceError::SessionNotFound => {
                ApiError::unauthorized(err.to_string())
            }
            AuthServiceError::UserNotFound(_) => ApiError::not_found(err.to_string()),
            AuthServiceError::EmailTaken(_) => ApiError::conflict(err.to_string()),
            AuthServiceError::Validation(_) => ApiError::validation_error(err.to_string()),
            AuthServiceError::Internal(e) => {
                tracing::error!("Auth service error: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<crate::services::PostServiceError> for ApiError {
    fn from(err: crate::services::PostServiceError) -> Self {
        use crate::services::PostServiceError::*;
        match err {
            NotFound(_) => ApiError::not_found("Post not found"),
            DuplicateSlug(_) => ApiError::conflict(err.to_string()),
            Validation(_) => ApiError::validation_error(err.to_string()),
            Internal(e) => {
                tracing::error!("Post service error: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<crate::services::VoiceServiceError> for ApiError {
    fn from(err: crate::services::VoiceServiceError) -> Self {
        use crate::services::VoiceServiceError::*;
        match err {
            NotFound(_) => ApiError::not_found("Voice not found"),
            DuplicateSlug(_) => ApiError::conflict(err.to_string()),
            Validation(_) => ApiError::validation_error(err.to_string()),
            Internal(e) => {
                tracing::error!("Voice service error: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<crate::services::NewsServiceError> for ApiError {
    fn from(err: crate::services::NewsServiceError) -> Self {
        use crate::services::NewsServiceError::*;
        match err {
            NotFound(_) => ApiError::not_found(err.to_string()),
            Upstream(msg) => {
                tracing::warn!("WordPress upstream error: {}", msg);
                ApiError::bad_gateway("News source unavailable")
            }
            Internal(e) => {
                tracing::error!("News service error: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

/// Extract the session token from the Authorization header
fn extract_session_token(request: &Request) -> Option<String> {
    let auth_header = request.headers().get(header::AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    auth_str.strip_prefix("Bearer ").map(|t| t.to_string())
}

/// Authentication middleware.
///
/// Resolves the bearer token to an admin user and stores it in request
/// extensions. Missing or invalid tokens are a 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state.auth_service.validate_session(&token).await?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Request statistics middleware; records count and response time
pub async fn request_stats_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    let duration_us = start.elapsed().as_micros() as u64;
    state.request_stats.record(duration_us);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{permissions, UserRole};

    fn user_with(perms: &[&str]) -> AuthenticatedUser {
        let mut user = AdminUser::new(
            "t@beyond2c.org".to_string(),
            "T".to_string(),
            "hash".to_string(),
            UserRole::Editor,
        );
        user.permissions = perms.iter().map(|s| s.to_string()).collect();
        AuthenticatedUser(user)
    }

    #[test]
    fn test_require_permission_exact_match_only() {
        let user = user_with(&[permissions::BLOGS_VIEW]);
        assert!(user.require_permission(permissions::BLOGS_VIEW).is_ok());
        assert!(user.require_permission(permissions::BLOGS_MANAGE).is_err());
        assert!(user.require_permission("blogs").is_err());
    }

    #[test]
    fn test_api_error_status_mapping() {
        let cases = [
            (ApiError::unauthorized("x"), StatusCode::UNAUTHORIZED),
            (ApiError::forbidden("x"), StatusCode::FORBIDDEN),
            (ApiError::not_found("x"), StatusCode::NOT_FOUND),
            (ApiError::validation_error("x"), StatusCode::BAD_REQUEST),
            (ApiError::conflict("x"), StatusCode::CONFLICT),
            (ApiError::rate_limited("x"), StatusCode::TOO_MANY_REQUESTS),
            (ApiError::internal_error("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_request_stats() {
        let stats = RequestStats::new();
        assert_eq!(stats.total_requests(), 0);
        assert_eq!(stats.avg_response_time_us(), 0.0);

        stats.record(100);
        stats.record(300);
        assert_eq!(stats.total_requests(), 2);
        assert_eq!(stats.avg_response_time_us(), 200.0);
    }
}
