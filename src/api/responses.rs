//! Shared API response types
//!
//! Every successful response uses the same envelope the frontend expects:
//! `{ "success": true, "data": ..., "pagination": ... }` with pagination
//! present only on list endpoints.

use serde::{Deserialize, Serialize};

use crate::models::{PagedResult, Voice};

/// Success envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// Pagination block for list responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: u32,
}

impl<T> ApiResponse<T> {
    /// Wrap a single payload
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            pagination: None,
        }
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// Wrap a paged result, lifting the page math into the envelope
    pub fn paged(result: PagedResult<T>) -> Self {
        let pagination = Pagination {
            page: result.page,
            per_page: result.per_page,
            total: result.total,
            total_pages: result.total_pages(),
        };
        Self {
            success: true,
            data: result.items,
            pagination: Some(pagination),
        }
    }
}

/// Voice shape for public endpoints.
///
/// The contact email stays private; everything else is shown.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicVoice {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub category: String,
    pub author_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_profession: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    pub reading_time: i32,
    pub published_at: Option<String>,
    pub view_count: i64,
    pub like_count: i64,
}

impl From<Voice> for PublicVoice {
    fn from(voice: Voice) -> Self {
        Self {
            id: voice.id,
            slug: voice.slug,
            title: voice.title,
            content: voice.content,
            excerpt: voice.excerpt,
            category: voice.category,
            author_name: voice.author_name,
            author_location: voice.author_location,
            author_profession: voice.author_profession,
            impact: voice.impact,
            reading_time: voice.reading_time,
            published_at: voice.published_at.map(|dt| dt.to_rfc3339()),
            view_count: voice.view_count,
            like_count: voice.like_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ListParams, VoiceStatus};
    use chrono::Utc;

    #[test]
    fn test_single_envelope_shape() {
        let response = ApiResponse::ok(serde_json::json!({"id": 1}));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["id"], 1);
        assert!(json.get("pagination").is_none());
    }

    #[test]
    fn test_paged_envelope_shape() {
        let params = ListParams::new(2, 10);
        let result = PagedResult::new(vec![1, 2, 3], 25, &params);
        let response = ApiResponse::paged(result);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["data"].as_array().unwrap().len(), 3);
        assert_eq!(json["pagination"]["page"], 2);
        assert_eq!(json["pagination"]["total"], 25);
        assert_eq!(json["pagination"]["total_pages"], 3);
    }

    #[test]
    fn test_public_voice_hides_email() {
        let voice = Voice {
            id: 1,
            slug: "s".to_string(),
            title: "T".to_string(),
            content: "C".to_string(),
            excerpt: "E".to_string(),
            category: "personal".to_string(),
            status: VoiceStatus::Published,
            author_name: "Deniz".to_string(),
            author_email: "secret@example.org".to_string(),
            author_location: None,
            author_profession: None,
            impact: None,
            reading_time: 1,
            published_at: Some(Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            view_count: 0,
            like_count: 0,
        };

        let json = serde_json::to_value(PublicVoice::from(voice)).unwrap();
        assert!(json.get("author_email").is_none());
        assert!(!json.to_string().contains("secret@example.org"));
    }
}
