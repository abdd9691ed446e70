//! Beyond2C - backend for the Beyond2C climate platform

use anyhow::Result;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use beyond2c::{
    api::{self, middleware::RequestStats, AppState},
    cache::create_cache,
    config::Config,
    db::{
        self,
        repositories::{
            SqlxPostRepository, SqlxSessionRepository, SqlxUserRepository, SqlxVoiceRepository,
        },
    },
    services::{AuthService, LoginRateLimiter, NewsService, PostService, VoiceService},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beyond2c=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Beyond2C backend...");

    // Load configuration (config.yml plus BEYOND2C_* overrides)
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Initialize cache
    let cache = create_cache(&config.cache);
    tracing::info!("Cache initialized");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let post_repo = SqlxPostRepository::boxed(pool.clone());
    let voice_repo = SqlxVoiceRepository::boxed(pool.clone());

    // Initialize services
    let cache_ttl = Duration::from_secs(config.cache.ttl_seconds);
    let auth_service = Arc::new(AuthService::new(
        user_repo,
        session_repo,
        config.auth.session_days,
    ));
    let post_service = Arc::new(PostService::new(post_repo, cache.clone(), cache_ttl));
    let voice_service = Arc::new(VoiceService::new(voice_repo, cache.clone(), cache_ttl));
    let news_service = Arc::new(NewsService::new(&config.news, cache.clone())?);

    let rate_limiter = Arc::new(LoginRateLimiter::new());
    let request_stats = Arc::new(RequestStats::new());

    let state = AppState {
        pool: pool.clone(),
        auth_service: auth_service.clone(),
        post_service,
        voice_service,
        news_service,
        rate_limiter: rate_limiter.clone(),
        upload_config: Arc::new(config.upload.clone()),
        request_stats,
    };

    // Periodic cleanup of rate limiter windows and expired sessions
    {
        let limiter = rate_limiter.clone();
        let auth = auth_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            loop {
                interval.tick().await;
                limiter.cleanup().await;
                if let Err(e) = auth.cleanup_expired_sessions().await {
                    tracing::warn!("Session cleanup failed: {}", e);
                }
            }
        });
    }

    // Build router
    let app = api::build_router(state, &config.server.cors_origin)?;

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
