//! Admin user management endpoints
//!
//! All routes require the `users.manage` permission. Password hashes never
//! leave the server; `AdminUser` skips the hash on serialization.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use crate::api::common::ListQuery;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::ApiResponse;
use crate::models::{permissions, AdminUser, CreateUserInput, UpdateUserInput};

/// Admin user routes (mounted behind the auth middleware)
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
}

/// GET /api/admin/users
async fn list_users(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<AdminUser>>>, ApiError> {
    user.require_permission(permissions::USERS_MANAGE)?;

    let result = state.auth_service.list_users(&query.params()).await?;
    Ok(Json(ApiResponse::paged(result)))
}

/// POST /api/admin/users
async fn create_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(input): Json<CreateUserInput>,
) -> Result<Json<ApiResponse<AdminUser>>, ApiError> {
    user.require_permission(permissions::USERS_MANAGE)?;

    let created = state.auth_service.create_user(input).await?;
    Ok(Json(ApiResponse::ok(created)))
}

/// GET /api/admin/users/{id}
async fn get_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<AdminUser>>, ApiError> {
    user.require_permission(permissions::USERS_MANAGE)?;

    let found = state.auth_service.get_user(id).await?;
    Ok(Json(ApiResponse::ok(found)))
}

/// PUT /api/admin/users/{id}
async fn update_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateUserInput>,
) -> Result<Json<ApiResponse<AdminUser>>, ApiError> {
    user.require_permission(permissions::USERS_MANAGE)?;

    let updated = state.auth_service.update_user(id, input).await?;
    Ok(Json(ApiResponse::ok(updated)))
}

/// DELETE /api/admin/users/{id}
async fn delete_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    user.require_permission(permissions::USERS_MANAGE)?;

    if user.0.id == id {
        return Err(ApiError::validation_error(
            "You cannot delete your own account",
        ));
    }

    state.auth_service.delete_user(id).await?;
    Ok(Json(ApiResponse::ok(serde_json::json!({"deleted": id}))))
}
