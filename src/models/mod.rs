//! Data models
//!
//! Entities and input types for the Beyond2C backend:
//! - `AdminUser` with role and flat permission strings
//! - `BlogPost` for the blog section
//! - `Voice` for user-submitted stories
//! - `Session` for authentication
//! - Shared pagination types

pub mod pagination;
pub mod post;
pub mod session;
pub mod user;
pub mod voice;

pub use pagination::{ListParams, PagedResult, SortDirection};
pub use post::{BlogPost, CreatePostInput, PostFilter, PostSortField, PostStatus, UpdatePostInput};
pub use session::Session;
pub use user::{permissions, AdminUser, CreateUserInput, UpdateUserInput, UserRole, UserStatus};
pub use voice::{CreateVoiceInput, UpdateVoiceInput, Voice, VoiceFilter, VoiceStatus};
