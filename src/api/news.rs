//! Public news endpoints backed by the WordPress REST API

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use crate::api::common::ListQuery;
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::ApiResponse;
use crate::services::NewsArticle;

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_news))
        .route("/{slug}", get(get_news))
}

/// GET /api/news
async fn list_news(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<NewsArticle>>>, ApiError> {
    let result = state.news_service.list_news(&query.params()).await?;
    Ok(Json(ApiResponse::paged(result)))
}

/// GET /api/news/{slug}
async fn get_news(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<NewsArticle>>, ApiError> {
    let article = state.news_service.get_by_slug(&slug).await?;
    Ok(Json(ApiResponse::ok(article)))
}
