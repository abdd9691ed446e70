//! Blog post API endpoints
//!
//! Admin CRUD under `/api/admin/blogs` and the public read endpoints for
//! the site. Admin access is permission-gated per operation: listing
//! needs `blogs.view`, mutations need `blogs.manage`.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::ListQuery;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::ApiResponse;
use crate::models::{permissions, BlogPost, CreatePostInput, PostStatus, UpdatePostInput};

/// Admin blog routes (mounted behind the auth middleware)
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/{id}", get(get_post).put(update_post).delete(delete_post))
}

/// Public blog routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_published))
        .route("/{slug}", get(get_published))
        .route("/{id}/like", post(like_post))
}

/// Create request body; the author is always the logged-in admin
#[derive(Debug, Deserialize)]
struct CreatePostRequest {
    title: String,
    content: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    excerpt: String,
    category: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    status: Option<PostStatus>,
    #[serde(default)]
    meta_title: Option<String>,
    #[serde(default)]
    meta_description: Option<String>,
}

/// GET /api/admin/blogs
async fn list_posts(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<BlogPost>>>, ApiError> {
    user.require_permission(permissions::BLOGS_VIEW)?;

    let result = state
        .post_service
        .list_posts(&query.post_filter(), &query.params())
        .await?;
    Ok(Json(ApiResponse::paged(result)))
}

/// POST /api/admin/blogs
async fn create_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreatePostRequest>,
) -> Result<Json<ApiResponse<BlogPost>>, ApiError> {
    user.require_permission(permissions::BLOGS_MANAGE)?;

    let input = CreatePostInput {
        title: body.title,
        content: body.content,
        slug: body.slug,
        excerpt: body.excerpt,
        category: body.category,
        tags: body.tags,
        author_id: user.0.id,
        status: body.status,
        meta_title: body.meta_title,
        meta_description: body.meta_description,
    };
    let post = state.post_service.create_post(input).await?;
    Ok(Json(ApiResponse::ok(post)))
}

/// GET /api/admin/blogs/{id}
async fn get_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<BlogPost>>, ApiError> {
    user.require_permission(permissions::BLOGS_VIEW)?;

    let post = state.post_service.get_post(id).await?;
    Ok(Json(ApiResponse::ok(post)))
}

/// PUT /api/admin/blogs/{id}
async fn update_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdatePostInput>,
) -> Result<Json<ApiResponse<BlogPost>>, ApiError> {
    user.require_permission(permissions::BLOGS_MANAGE)?;

    let post = state.post_service.update_post(id, input).await?;
    Ok(Json(ApiResponse::ok(post)))
}

/// DELETE /api/admin/blogs/{id}
async fn delete_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    user.require_permission(permissions::BLOGS_MANAGE)?;

    state.post_service.delete_post(id).await?;
    Ok(Json(ApiResponse::ok(serde_json::json!({"deleted": id}))))
}

/// GET /api/blogs - published posts for the public site
async fn list_published(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<BlogPost>>>, ApiError> {
    let result = state
        .post_service
        .list_published(query.category.clone(), &query.params())
        .await?;
    Ok(Json(ApiResponse::paged(result)))
}

/// GET /api/blogs/{slug}
async fn get_published(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<BlogPost>>, ApiError> {
    let post = state.post_service.get_published_by_slug(&slug).await?;
    Ok(Json(ApiResponse::ok(post)))
}

/// POST /api/blogs/{id}/like
async fn like_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let likes = state.post_service.like_post(id).await?;
    Ok(Json(ApiResponse::ok(serde_json::json!({"like_count": likes}))))
}
