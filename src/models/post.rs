//! Blog post model
//!
//! This module provides:
//! - `BlogPost` entity for the blog section
//! - `PostStatus` enum for publication states
//! - Input types for creating and updating posts
//! - `PostFilter` describing list-endpoint query parameters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pagination::SortDirection;

/// Blog post entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPost {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug (unique)
    pub slug: String,
    /// Post title
    pub title: String,
    /// HTML content
    pub content: String,
    /// Short excerpt for list views
    pub excerpt: String,
    /// Category key
    pub category: String,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Author user ID
    pub author_id: i64,
    /// Publication status
    pub status: PostStatus,
    /// SEO meta title
    #[serde(default)]
    pub meta_title: String,
    /// SEO meta description
    #[serde(default)]
    pub meta_description: String,
    /// Estimated reading time in minutes
    #[serde(default)]
    pub reading_time: i32,
    /// Publication timestamp
    pub published_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// View count
    #[serde(default)]
    pub view_count: i64,
    /// Like count
    #[serde(default)]
    pub like_count: i64,
}

/// Post publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// Draft - not visible to public
    Draft,
    /// Published - visible to public
    Published,
    /// Archived - hidden but not deleted
    Archived,
}

impl Default for PostStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl PostStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }

    /// Parse status from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            "archived" => Some(PostStatus::Archived),
            _ => None,
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for creating a new blog post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostInput {
    /// Post title
    pub title: String,
    /// HTML content
    pub content: String,
    /// Explicit slug; derived from the title when empty
    #[serde(default)]
    pub slug: String,
    /// Explicit excerpt; derived from the content when empty
    #[serde(default)]
    pub excerpt: String,
    /// Category key
    pub category: String,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Author user ID
    pub author_id: i64,
    /// Publication status (defaults to Draft)
    pub status: Option<PostStatus>,
    /// Explicit SEO meta title; derived from the title when absent
    pub meta_title: Option<String>,
    /// Explicit SEO meta description; derived from the content when absent
    pub meta_description: Option<String>,
}

/// Input for updating an existing blog post
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<PostStatus>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

impl UpdatePostInput {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.content.is_some()
            || self.slug.is_some()
            || self.excerpt.is_some()
            || self.category.is_some()
            || self.tags.is_some()
            || self.status.is_some()
            || self.meta_title.is_some()
            || self.meta_description.is_some()
    }
}

/// Sortable columns for post list queries.
///
/// A closed enum keeps user-supplied sort fields away from SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostSortField {
    #[default]
    CreatedAt,
    PublishedAt,
    Title,
    ViewCount,
}

impl PostSortField {
    /// Column name for ORDER BY clauses
    pub fn as_column(&self) -> &'static str {
        match self {
            PostSortField::CreatedAt => "created_at",
            PostSortField::PublishedAt => "published_at",
            PostSortField::Title => "title",
            PostSortField::ViewCount => "view_count",
        }
    }

    /// Parse from a query-string value; unknown fields fall back to created_at
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "published_at" => PostSortField::PublishedAt,
            "title" => PostSortField::Title,
            "view_count" | "views" => PostSortField::ViewCount,
            _ => PostSortField::CreatedAt,
        }
    }
}

/// Filter parameters for post list queries
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Search text matched against title and content
    pub search: Option<String>,
    /// Filter by status
    pub status: Option<PostStatus>,
    /// Filter by category
    pub category: Option<String>,
    /// Sort field
    pub sort_by: PostSortField,
    /// Sort direction
    pub sort_dir: SortDirection,
}
