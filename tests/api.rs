//! HTTP-level integration tests against an in-memory database

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use serde_json::{json, Value};

use beyond2c::{
    api::{self, AppState, RequestStats},
    cache::create_cache,
    config::{CacheConfig, NewsConfig, UploadConfig},
    db::{
        self,
        repositories::{
            SqlxPostRepository, SqlxSessionRepository, SqlxUserRepository, SqlxVoiceRepository,
        },
    },
    models::{CreateUserInput, UserRole},
    services::{AuthService, LoginRateLimiter, NewsService, PostService, VoiceService},
};

async fn setup_state() -> AppState {
    let pool = db::create_test_pool().await.unwrap();
    db::migrations::run_migrations(&pool).await.unwrap();

    let cache = create_cache(&CacheConfig {
        ttl_seconds: 60,
        capacity: 1000,
    });
    let cache_ttl = Duration::from_secs(60);

    let auth_service = Arc::new(AuthService::new(
        SqlxUserRepository::boxed(pool.clone()),
        SqlxSessionRepository::boxed(pool.clone()),
        7,
    ));
    let post_service = Arc::new(PostService::new(
        SqlxPostRepository::boxed(pool.clone()),
        cache.clone(),
        cache_ttl,
    ));
    let voice_service = Arc::new(VoiceService::new(
        SqlxVoiceRepository::boxed(pool.clone()),
        cache.clone(),
        cache_ttl,
    ));
    let news_config = NewsConfig {
        base_url: "http://127.0.0.1:1/wp-json/wp/v2".to_string(),
        ttl_seconds: 60,
        timeout_seconds: 1,
    };
    let news_service = Arc::new(NewsService::new(&news_config, cache.clone()).unwrap());

    let upload_dir = std::env::temp_dir().join(format!("beyond2c-test-{}", uuid::Uuid::new_v4()));
    let upload_config = UploadConfig {
        path: upload_dir,
        ..Default::default()
    };

    AppState {
        pool,
        auth_service,
        post_service,
        voice_service,
        news_service,
        rate_limiter: Arc::new(LoginRateLimiter::new()),
        upload_config: Arc::new(upload_config),
        request_stats: Arc::new(RequestStats::new()),
    }
}

async fn setup() -> (TestServer, AppState) {
    let state = setup_state().await;
    let app = api::build_router(state.clone(), "http://localhost:3000").unwrap();
    (TestServer::new(app).unwrap(), state)
}

/// Server on a real local port, so `ConnectInfo` carries a peer address
/// and the login route can be driven over HTTP.
async fn setup_http() -> (TestServer, AppState) {
    let state = setup_state().await;
    let app = api::build_router(state.clone(), "http://localhost:3000").unwrap();
    let server = TestServer::builder()
        .http_transport()
        .build(app.into_make_service_with_connect_info::<SocketAddr>())
        .unwrap();
    (server, state)
}

/// Create a user and return a session token. The first user in a fresh
/// database always becomes a super admin.
async fn login_as(state: &AppState, email: &str, role: UserRole) -> String {
    state
        .auth_service
        .create_user(CreateUserInput {
            email: email.to_string(),
            display_name: "Test Admin".to_string(),
            password: "climate-action-now".to_string(),
            role: Some(role),
            permissions: None,
        })
        .await
        .unwrap();
    let (_, session) = state
        .auth_service
        .login(email, "climate-action-now")
        .await
        .unwrap();
    session.id
}

#[tokio::test]
async fn public_blog_list_returns_envelope() {
    let (server, _state) = setup().await;

    let response = server.get("/api/blogs").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["total"], 0);
    assert_eq!(body["pagination"]["total_pages"], 0);
}

#[tokio::test]
async fn admin_routes_require_token() {
    let (server, _state) = setup().await;

    let response = server.get("/api/admin/blogs").await;
    response.assert_status_unauthorized();

    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn blog_create_and_public_read() {
    let (server, state) = setup().await;
    let token = login_as(&state, "admin@beyond2c.org", UserRole::SuperAdmin).await;

    let response = server
        .post("/api/admin/blogs")
        .authorization_bearer(&token)
        .json(&json!({
            "title": "İklim Değişikliği ve Biz",
            "content": "<p>Köklü bir dönüşüm gerekiyor.</p>",
            "category": "iklim",
            "status": "published"
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["data"]["slug"], "iklim-degisikligi-ve-biz");
    assert!(body["data"]["reading_time"].as_i64().unwrap() >= 1);

    // Visible on the public endpoint, and the view counter ticks
    let public = server.get("/api/blogs/iklim-degisikligi-ve-biz").await;
    public.assert_status_ok();
    let public_body: Value = public.json();
    assert_eq!(public_body["data"]["title"], "İklim Değişikliği ve Biz");
}

#[tokio::test]
async fn moderator_cannot_manage_blogs() {
    let (server, state) = setup().await;
    // First account becomes super admin, the second keeps its role
    login_as(&state, "root@beyond2c.org", UserRole::SuperAdmin).await;
    let token = login_as(&state, "mod@beyond2c.org", UserRole::Moderator).await;

    let response = server
        .get("/api/admin/blogs")
        .authorization_bearer(&token)
        .await;
    response.assert_status_forbidden();

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    // Voice review is allowed for moderators
    let voices = server
        .get("/api/admin/voices")
        .authorization_bearer(&token)
        .await;
    voices.assert_status_ok();
}

#[tokio::test]
async fn voice_submission_is_pending_and_email_stays_private() {
    let (server, state) = setup().await;

    let response = server
        .post("/api/voices")
        .json(&json!({
            "title": "Mahallemizde Sel",
            "content": "Geçen yıl iki kez evimizi su bastı.",
            "category": "personal",
            "author_name": "Ayşe Yılmaz",
            "author_email": "ayse@example.org",
            "status": "published"
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert!(body["data"].get("author_email").is_none());

    // The requested status was ignored; nothing is publicly listed yet
    let public = server.get("/api/voices").await;
    let public_body: Value = public.json();
    assert!(public_body["data"].as_array().unwrap().is_empty());

    // Admins see the pending submission with the contact email
    let token = login_as(&state, "admin@beyond2c.org", UserRole::SuperAdmin).await;
    let admin = server
        .get("/api/admin/voices")
        .authorization_bearer(&token)
        .await;
    let admin_body: Value = admin.json();
    let voice = &admin_body["data"][0];
    assert_eq!(voice["status"], "pending");
    assert_eq!(voice["author_email"], "ayse@example.org");

    // Approve it and it shows up publicly
    let id = voice["id"].as_i64().unwrap();
    let approve = server
        .post(&format!("/api/admin/voices/{}/approve", id))
        .authorization_bearer(&token)
        .await;
    approve.assert_status_ok();

    let public = server.get("/api/voices").await;
    let public_body: Value = public.json();
    assert_eq!(public_body["data"].as_array().unwrap().len(), 1);
    assert_eq!(public_body["data"][0]["author_name"], "Ayşe Yılmaz");
}

#[tokio::test]
async fn duplicate_slug_conflicts() {
    let (server, state) = setup().await;
    let token = login_as(&state, "admin@beyond2c.org", UserRole::SuperAdmin).await;

    let post = json!({
        "title": "Tek Başlık",
        "content": "içerik",
        "category": "iklim"
    });
    server
        .post("/api/admin/blogs")
        .authorization_bearer(&token)
        .json(&post)
        .await
        .assert_status_ok();

    let second = server
        .post("/api/admin/blogs")
        .authorization_bearer(&token)
        .json(&post)
        .await;
    second.assert_status(axum::http::StatusCode::CONFLICT);

    let body: Value = second.json();
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn login_over_http_rate_limits_failures() {
    let (server, state) = setup_http().await;
    state
        .auth_service
        .create_user(CreateUserInput {
            email: "admin@beyond2c.org".to_string(),
            display_name: "Test Admin".to_string(),
            password: "climate-action-now".to_string(),
            role: Some(UserRole::SuperAdmin),
            permissions: None,
        })
        .await
        .unwrap();

    let ok = server
        .post("/api/auth/login")
        .json(&json!({
            "email": "admin@beyond2c.org",
            "password": "climate-action-now"
        }))
        .await;
    ok.assert_status_ok();
    let body: Value = ok.json();
    let token = body["data"]["token"].as_str().unwrap().to_string();

    // The issued token authenticates protected routes
    let me = server
        .get("/api/auth/me")
        .authorization_bearer(&token)
        .await;
    me.assert_status_ok();

    // Five failed attempts exhaust the per-account window
    let bad = json!({
        "email": "admin@beyond2c.org",
        "password": "wrong-password"
    });
    for _ in 0..5 {
        server
            .post("/api/auth/login")
            .json(&bad)
            .await
            .assert_status_unauthorized();
    }

    let limited = server.post("/api/auth/login").json(&bad).await;
    limited.assert_status(axum::http::StatusCode::TOO_MANY_REQUESTS);
    let body: Value = limited.json();
    assert_eq!(body["error"]["code"], "RATE_LIMITED");
}
