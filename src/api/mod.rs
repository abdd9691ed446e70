//! API layer - HTTP handlers and routing
//!
//! Routes split into three groups: public site endpoints, the
//! unauthenticated login/submission endpoints, and the admin panel routes
//! behind the bearer-token middleware. Permission checks happen per
//! handler; the middleware only resolves the session.

pub mod analytics;
pub mod auth;
pub mod blogs;
pub mod common;
pub mod middleware;
pub mod news;
pub mod responses;
pub mod upload;
pub mod users;
pub mod voices;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware, Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use middleware::{ApiError, AppState, AuthenticatedUser, RequestStats};
pub use responses::{ApiResponse, Pagination, PublicVoice};

/// Build the API router mounted under `/api`
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin panel routes, all behind the session middleware
    let admin_routes = Router::new()
        .nest("/admin/blogs", blogs::admin_router())
        .nest("/admin/voices", voices::admin_router())
        .nest("/admin/users", users::admin_router())
        .nest("/admin/analytics", analytics::admin_router())
        .nest("/admin/uploads", upload::admin_router())
        .nest("/auth", auth::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .nest("/blogs", blogs::public_router())
        .nest("/voices", voices::public_router())
        .nest("/news", news::public_router())
        .nest("/auth", auth::public_router())
        .merge(admin_routes)
}

/// Build the complete application router
pub fn build_router(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let router = Router::new()
        .nest("/api", build_api_router(state.clone()))
        // Uploaded files are served straight from disk
        .nest_service("/uploads", ServeDir::new(&state.upload_config.path))
        .layer(
            // Request stats sit outermost so every request is counted
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn_with_state(
                    state.clone(),
                    middleware::request_stats_middleware,
                ))
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    Ok(router)
}
