//! Voice API endpoints
//!
//! Public endpoints serve published voices only and never expose the
//! submitter's email. The submission endpoint is unauthenticated; new
//! stories always land as pending regardless of what the payload asks
//! for. Admin endpoints return the full record and are gated by
//! `voices.view` for reads and `voices.moderate` for everything else.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};

use crate::api::common::ListQuery;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{ApiResponse, PublicVoice};
use crate::models::{permissions, CreateVoiceInput, UpdateVoiceInput, Voice};

/// Admin voice routes (mounted behind the auth middleware)
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_voices).post(create_voice))
        .route(
            "/{id}",
            get(get_voice).put(update_voice).delete(delete_voice),
        )
        .route("/{id}/approve", post(approve_voice))
        .route("/{id}/reject", post(reject_voice))
}

/// Public voice routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_published).post(submit_voice))
        .route("/{slug}", get(get_published))
        .route("/{id}/like", post(like_voice))
}

/// GET /api/admin/voices
async fn list_voices(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<Voice>>>, ApiError> {
    user.require_permission(permissions::VOICES_VIEW)?;

    let result = state
        .voice_service
        .list_voices(&query.voice_filter(), &query.params())
        .await?;
    Ok(Json(ApiResponse::paged(result)))
}

/// POST /api/admin/voices - editorial creation, honors the given status
async fn create_voice(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(input): Json<CreateVoiceInput>,
) -> Result<Json<ApiResponse<Voice>>, ApiError> {
    user.require_permission(permissions::VOICES_MODERATE)?;

    let voice = state.voice_service.create_voice(input).await?;
    Ok(Json(ApiResponse::ok(voice)))
}

/// GET /api/admin/voices/{id}
async fn get_voice(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Voice>>, ApiError> {
    user.require_permission(permissions::VOICES_VIEW)?;

    let voice = state.voice_service.get_voice(id).await?;
    Ok(Json(ApiResponse::ok(voice)))
}

/// PUT /api/admin/voices/{id}
async fn update_voice(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateVoiceInput>,
) -> Result<Json<ApiResponse<Voice>>, ApiError> {
    user.require_permission(permissions::VOICES_MODERATE)?;

    let voice = state.voice_service.update_voice(id, input).await?;
    Ok(Json(ApiResponse::ok(voice)))
}

/// DELETE /api/admin/voices/{id}
async fn delete_voice(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    user.require_permission(permissions::VOICES_MODERATE)?;

    state.voice_service.delete_voice(id).await?;
    Ok(Json(ApiResponse::ok(serde_json::json!({"deleted": id}))))
}

/// POST /api/admin/voices/{id}/approve
async fn approve_voice(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Voice>>, ApiError> {
    user.require_permission(permissions::VOICES_MODERATE)?;

    let voice = state.voice_service.approve_voice(id).await?;
    Ok(Json(ApiResponse::ok(voice)))
}

/// POST /api/admin/voices/{id}/reject
async fn reject_voice(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Voice>>, ApiError> {
    user.require_permission(permissions::VOICES_MODERATE)?;

    let voice = state.voice_service.reject_voice(id).await?;
    Ok(Json(ApiResponse::ok(voice)))
}

/// GET /api/voices - published voices for the public site
async fn list_published(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<PublicVoice>>>, ApiError> {
    let result = state
        .voice_service
        .list_published(query.category.clone(), &query.params())
        .await?;
    Ok(Json(ApiResponse::paged(result.map(PublicVoice::from))))
}

/// GET /api/voices/{slug}
async fn get_published(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<PublicVoice>>, ApiError> {
    let voice = state.voice_service.get_published_by_slug(&slug).await?;
    Ok(Json(ApiResponse::ok(PublicVoice::from(voice))))
}

/// POST /api/voices - public story submission, always lands as pending
async fn submit_voice(
    State(state): State<AppState>,
    Json(input): Json<CreateVoiceInput>,
) -> Result<Json<ApiResponse<PublicVoice>>, ApiError> {
    let voice = state.voice_service.submit_voice(input).await?;
    Ok(Json(ApiResponse::ok(PublicVoice::from(voice))))
}

/// POST /api/voices/{id}/like
async fn like_voice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let likes = state.voice_service.like_voice(id).await?;
    Ok(Json(ApiResponse::ok(serde_json::json!({"like_count": likes}))))
}
