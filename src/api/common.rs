//! Common API utilities and shared query types

use serde::Deserialize;

use crate::models::{ListParams, PostFilter, PostSortField, SortDirection, VoiceFilter};

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    10
}

/// Query parameters shared by all list endpoints.
///
/// Page and per_page are clamped by `ListParams::new`; unknown sort fields
/// and directions fall back to their defaults rather than erroring.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_dir: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
            search: None,
            status: None,
            category: None,
            sort_by: None,
            sort_dir: None,
        }
    }
}

impl ListQuery {
    /// Clamped pagination parameters
    pub fn params(&self) -> ListParams {
        ListParams::new(self.page, self.per_page)
    }

    fn sort_by(&self) -> PostSortField {
        self.sort_by
            .as_deref()
            .map(PostSortField::from_str)
            .unwrap_or_default()
    }

    fn sort_dir(&self) -> SortDirection {
        self.sort_dir
            .as_deref()
            .map(SortDirection::from_str)
            .unwrap_or_default()
    }

    fn search(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    }

    /// Build a post filter. An unknown status string filters nothing out.
    pub fn post_filter(&self) -> PostFilter {
        PostFilter {
            search: self.search(),
            status: self
                .status
                .as_deref()
                .and_then(crate::models::PostStatus::from_str),
            category: self.category.clone(),
            sort_by: self.sort_by(),
            sort_dir: self.sort_dir(),
        }
    }

    /// Build a voice filter
    pub fn voice_filter(&self) -> VoiceFilter {
        VoiceFilter {
            search: self.search(),
            status: self
                .status
                .as_deref()
                .and_then(crate::models::VoiceStatus::from_str),
            category: self.category.clone(),
            sort_by: self.sort_by(),
            sort_dir: self.sort_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostStatus;

    #[test]
    fn test_defaults() {
        let query = ListQuery::default();
        let params = query.params();
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 10);

        let filter = query.post_filter();
        assert!(filter.search.is_none());
        assert!(filter.status.is_none());
        assert_eq!(filter.sort_by, PostSortField::CreatedAt);
        assert_eq!(filter.sort_dir, SortDirection::Desc);
    }

    #[test]
    fn test_filter_parsing() {
        let query = ListQuery {
            status: Some("published".to_string()),
            sort_by: Some("title".to_string()),
            sort_dir: Some("asc".to_string()),
            search: Some("  iklim  ".to_string()),
            ..Default::default()
        };

        let filter = query.post_filter();
        assert_eq!(filter.status, Some(PostStatus::Published));
        assert_eq!(filter.sort_by, PostSortField::Title);
        assert_eq!(filter.sort_dir, SortDirection::Asc);
        assert_eq!(filter.search.as_deref(), Some("iklim"));
    }

    #[test]
    fn test_unknown_status_ignored() {
        let query = ListQuery {
            status: Some("bogus".to_string()),
            ..Default::default()
        };
        assert!(query.post_filter().status.is_none());
        assert!(query.voice_filter().status.is_none());
    }

    #[test]
    fn test_blank_search_dropped() {
        let query = ListQuery {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(query.post_filter().search.is_none());
    }
}
