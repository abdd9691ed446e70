//! WordPress news service
//!
//! Fetches article lists and single articles from the organization's
//! WordPress instance over its public REST API, maps them into a local
//! display shape, and caches the responses. WordPress reports the total
//! result count in the `X-WP-Total` response header.

use crate::cache::{keys, CacheLayer, MemoryCache};
use crate::config::NewsConfig;
use crate::models::{ListParams, PagedResult};
use crate::services::seo;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// News service errors
#[derive(Debug, Error)]
pub enum NewsServiceError {
    /// Article not found upstream
    #[error("News article not found: {0}")]
    NotFound(String),

    /// WordPress returned an error or unusable payload
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// A news article in local display shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    /// WordPress post ID
    pub id: i64,
    /// URL slug
    pub slug: String,
    /// Title (plain text)
    pub title: String,
    /// Short excerpt (plain text)
    pub excerpt: String,
    /// Full HTML content
    pub content: String,
    /// Canonical link on the WordPress site
    pub link: String,
    /// Publication date (WordPress local time, ISO 8601)
    pub date: String,
    /// Featured image URL, when one is attached
    pub featured_image: Option<String>,
}

/// Raw WordPress post payload, reduced to the fields we use
#[derive(Debug, Deserialize)]
struct WpPost {
    id: i64,
    slug: String,
    date: String,
    link: String,
    title: WpRendered,
    excerpt: WpRendered,
    content: WpRendered,
    #[serde(default, rename = "_embedded")]
    embedded: Option<WpEmbedded>,
}

#[derive(Debug, Deserialize)]
struct WpRendered {
    rendered: String,
}

#[derive(Debug, Deserialize)]
struct WpEmbedded {
    #[serde(default, rename = "wp:featuredmedia")]
    featured_media: Vec<WpMedia>,
}

#[derive(Debug, Deserialize)]
struct WpMedia {
    #[serde(default)]
    source_url: Option<String>,
}

impl From<WpPost> for NewsArticle {
    fn from(post: WpPost) -> Self {
        let featured_image = post
            .embedded
            .and_then(|e| e.featured_media.into_iter().next())
            .and_then(|m| m.source_url);

        Self {
            id: post.id,
            slug: post.slug,
            title: seo::strip_html(&post.title.rendered),
            excerpt: seo::strip_html(&post.excerpt.rendered),
            content: post.content.rendered,
            link: post.link,
            date: post.date,
            featured_image,
        }
    }
}

/// WordPress news client
pub struct NewsService {
    client: reqwest::Client,
    base_url: String,
    cache: Arc<MemoryCache>,
    cache_ttl: Duration,
}

impl NewsService {
    /// Create a new news service from configuration
    pub fn new(config: &NewsConfig, cache: Arc<MemoryCache>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache,
            cache_ttl: Duration::from_secs(config.ttl_seconds),
        })
    }

    /// List news articles, cached per page
    pub async fn list_news(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<NewsArticle>, NewsServiceError> {
        let cache_key = format!("{}list:{}:{}", keys::NEWS, params.page, params.per_page);
        if let Ok(Some(cached)) = self
            .cache
            .get::<PagedResult<NewsArticle>>(&cache_key)
            .await
        {
            return Ok(cached);
        }

        let url = format!(
            "{}/posts?page={}&per_page={}&_embed=wp:featuredmedia",
            self.base_url, params.page, params.per_page
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| NewsServiceError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NewsServiceError::Upstream(format!(
                "WordPress returned {}",
                response.status()
            )));
        }

        let total: i64 = response
            .headers()
            .get("x-wp-total")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        let posts: Vec<WpPost> = response
            .json()
            .await
            .map_err(|e| NewsServiceError::Upstream(format!("Bad payload: {}", e)))?;

        let items: Vec<NewsArticle> = posts.into_iter().map(NewsArticle::from).collect();
        let total = total.max(items.len() as i64);
        let result = PagedResult::new(items, total, params);

        if let Err(e) = self.cache.set(&cache_key, &result, self.cache_ttl).await {
            tracing::warn!("Failed to cache news list: {}", e);
        }
        Ok(result)
    }

    /// Get a single news article by slug, cached
    pub async fn get_by_slug(&self, slug: &str) -> Result<NewsArticle, NewsServiceError> {
        let cache_key = format!("{}slug:{}", keys::NEWS, slug);
        if let Ok(Some(cached)) = self.cache.get::<NewsArticle>(&cache_key).await {
            return Ok(cached);
        }

        let url = format!(
            "{}/posts?slug={}&_embed=wp:featuredmedia",
            self.base_url,
            urlencoding::encode(slug)
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| NewsServiceError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NewsServiceError::Upstream(format!(
                "WordPress returned {}",
                response.status()
            )));
        }

        let posts: Vec<WpPost> = response
            .json()
            .await
            .map_err(|e| NewsServiceError::Upstream(format!("Bad payload: {}", e)))?;

        let article = posts
            .into_iter()
            .next()
            .map(NewsArticle::from)
            .ok_or_else(|| NewsServiceError::NotFound(slug.to_string()))?;

        if let Err(e) = self.cache.set(&cache_key, &article, self.cache_ttl).await {
            tracing::warn!("Failed to cache news article: {}", e);
        }
        Ok(article)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wp_post_json() -> &'static str {
        r#"{
            "id": 42,
            "slug": "iklim-haberi",
            "date": "2025-11-03T10:00:00",
            "link": "https://beyond2c.org/iklim-haberi",
            "title": {"rendered": "İklim <em>Haberi</em>"},
            "excerpt": {"rendered": "<p>Kısa özet&hellip;</p>"},
            "content": {"rendered": "<p>Tam içerik</p>"},
            "_embedded": {
                "wp:featuredmedia": [{"source_url": "https://beyond2c.org/img.jpg"}]
            }
        }"#
    }

    #[test]
    fn test_wp_post_maps_to_article() {
        let post: WpPost = serde_json::from_str(wp_post_json()).unwrap();
        let article = NewsArticle::from(post);

        assert_eq!(article.id, 42);
        assert_eq!(article.slug, "iklim-haberi");
        assert_eq!(article.title, "İklim Haberi");
        assert_eq!(article.content, "<p>Tam içerik</p>");
        assert_eq!(
            article.featured_image.as_deref(),
            Some("https://beyond2c.org/img.jpg")
        );
    }

    #[test]
    fn test_wp_post_without_media() {
        let json = r#"{
            "id": 1,
            "slug": "s",
            "date": "2025-01-01T00:00:00",
            "link": "https://beyond2c.org/s",
            "title": {"rendered": "T"},
            "excerpt": {"rendered": "E"},
            "content": {"rendered": "C"}
        }"#;
        let post: WpPost = serde_json::from_str(json).unwrap();
        let article = NewsArticle::from(post);
        assert!(article.featured_image.is_none());
    }

    #[test]
    fn test_service_construction() {
        let config = NewsConfig::default();
        let service = NewsService::new(&config, Arc::new(MemoryCache::new())).unwrap();
        assert!(service.base_url.ends_with("/wp/v2"));
    }
}
