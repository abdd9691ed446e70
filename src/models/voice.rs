//! Voice model
//!
//! A "voice" is a user-submitted climate story. Structurally it is a blog
//! post with extra author/impact metadata and a moderation lifecycle:
//! public submissions land as Pending and an admin publishes or rejects
//! them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pagination::SortDirection;
use super::post::PostSortField;

/// Voice entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voice {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug (unique)
    pub slug: String,
    /// Story title
    pub title: String,
    /// HTML content
    pub content: String,
    /// Short excerpt for list views
    pub excerpt: String,
    /// Category key
    pub category: String,
    /// Moderation status
    pub status: VoiceStatus,
    /// Name of the person telling the story
    pub author_name: String,
    /// Contact email (never serialized to public responses elsewhere)
    pub author_email: String,
    /// Author location (city/country)
    #[serde(default)]
    pub author_location: Option<String>,
    /// Author profession
    #[serde(default)]
    pub author_profession: Option<String>,
    /// Short statement about the impact described in the story
    #[serde(default)]
    pub impact: Option<String>,
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

/// Voice moderation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceStatus {
    /// Submitted, awaiting moderation
    Pending,
    /// Approved and publicly visible
    Published,
    /// Declined by a moderator
    Rejected,
    /// Hidden but not deleted
    Archived,
}

impl Default for VoiceStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl VoiceStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceStatus::Pending => "pending",
            VoiceStatus::Published => "published",
            VoiceStatus::Rejected => "rejected",
            VoiceStatus::Archived => "archived",
        }
    }

    /// Parse status from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(VoiceStatus::Pending),
            "published" => Some(VoiceStatus::Published),
            "rejected" => Some(VoiceStatus::Rejected),
            "archived" => Some(VoiceStatus::Archived),
            _ => None,
        }
    }
}

impl std::fmt::Display for VoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for submitting a new voice.
///
/// Used by both the public submission endpoint and the admin editor; the
/// public path ignores `status` and always creates a Pending record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVoiceInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub excerpt: String,
    pub category: String,
    pub author_name: String,
    pub author_email: String,
    #[serde(default)]
    pub author_location: Option<String>,
    #[serde(default)]
    pub author_profession: Option<String>,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub status: Option<VoiceStatus>,
}

/// Input for updating an existing voice
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateVoiceInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub category: Option<String>,
    pub status: Option<VoiceStatus>,
    pub author_name: Option<String>,
    pub author_location: Option<String>,
    pub author_profession: Option<String>,
    pub impact: Option<String>,
}

impl UpdateVoiceInput {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.content.is_some()
            || self.slug.is_some()
            || self.excerpt.is_some()
            || self.category.is_some()
            || self.status.is_some()
            || self.author_name.is_some()
            || self.author_location.is_some()
            || self.author_profession.is_some()
            || self.impact.is_some()
    }
}

/// Filter parameters for voice list queries
#[derive(Debug, Clone, Default)]
pub struct VoiceFilter {
    /// Search text matched against title, content, and author name
    pub search: Option<String>,
    /// Filter by status
    pub status: Option<VoiceStatus>,
    /// Filter by category
    pub category: Option<String>,
    /// Sort field (shares the post column set)
    pub sort_by: PostSortField,
    /// Sort direction
    pub sort_dir: SortDirection,
}
