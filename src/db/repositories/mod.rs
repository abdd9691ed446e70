//! Repository layer
//!
//! Trait-based data access with sqlx implementations that dispatch on the
//! configured database driver.

pub mod post;
pub mod session;
pub mod user;
pub mod voice;

pub use post::{PostRepository, SqlxPostRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
pub use voice::{SqlxVoiceRepository, VoiceRepository};
