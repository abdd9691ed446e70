//! Services layer - business logic
//!
//! Services implement the business rules, coordinate repositories and the
//! cache, and own validation and error cases. Handlers in `api` stay thin.

pub mod auth;
pub mod news;
pub mod password;
pub mod post;
pub mod rate_limiter;
pub mod seo;
pub mod voice;

pub use auth::{AuthService, AuthServiceError};
pub use news::{NewsArticle, NewsService, NewsServiceError};
pub use password::{hash_password, verify_password};
pub use post::{PostService, PostServiceError};
pub use rate_limiter::LoginRateLimiter;
pub use voice::{VoiceService, VoiceServiceError};
