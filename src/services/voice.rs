//! Voice service
//!
//! Business logic for submitted climate stories. Public submissions always
//! enter as Pending; moderators publish or reject them from the admin
//! panel. Slugs are derived from the title and deduplicated automatically,
//! because submitters never pick their own.

use crate::cache::{keys, CacheLayer, MemoryCache};
use crate::db::repositories::VoiceRepository;
use crate::models::{
    CreateVoiceInput, ListParams, PagedResult, UpdateVoiceInput, Voice, VoiceFilter, VoiceStatus,
};
use crate::services::seo;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on slug dedup attempts before giving up
const MAX_SLUG_ATTEMPTS: u32 = 50;

/// Voice service errors
#[derive(Debug, Error)]
pub enum VoiceServiceError {
    /// Voice not found
    #[error("Voice not found: {0}")]
    NotFound(i64),

    /// Slug already in use by another voice
    #[error("Slug already exists: {0}")]
    DuplicateSlug(String),

    /// Input validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Voice service
pub struct VoiceService {
    voices: Arc<dyn VoiceRepository>,
    cache: Arc<MemoryCache>,
    cache_ttl: Duration,
}

impl VoiceService {
    /// Create a new voice service
    pub fn new(
        voices: Arc<dyn VoiceRepository>,
        cache: Arc<MemoryCache>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            voices,
            cache,
            cache_ttl,
        }
    }

    /// Accept a public voice submission.
    ///
    /// Any requested status is ignored; submissions always start Pending.
    /// A colliding slug gets a numeric suffix instead of an error, since
    /// the submitter has no way to choose another.
    pub async fn submit_voice(&self, input: CreateVoiceInput) -> Result<Voice, VoiceServiceError> {
        let mut voice = self.build_voice(input, VoiceStatus::Pending, true).await?;
        voice = self.voices.create(&voice).await?;
        tracing::info!(voice_id = voice.id, "Voice submitted for moderation");
        Ok(voice)
    }

    /// Create a voice from the admin panel.
    ///
    /// The requested status is honored and slug collisions are an error.
    pub async fn create_voice(&self, input: CreateVoiceInput) -> Result<Voice, VoiceServiceError> {
        let status = input.status.unwrap_or_default();
        let voice = self.build_voice(input, status, false).await?;
        let created = self.voices.create(&voice).await?;
        self.invalidate_cache().await;
        tracing::info!(voice_id = created.id, slug = %created.slug, "Voice created");
        Ok(created)
    }

    async fn build_voice(
        &self,
        input: CreateVoiceInput,
        status: VoiceStatus,
        dedupe_slug: bool,
    ) -> Result<Voice, VoiceServiceError> {
        if input.title.trim().is_empty() {
            return Err(VoiceServiceError::Validation(
                "Title must not be empty".to_string(),
            ));
        }
        if input.content.trim().is_empty() {
            return Err(VoiceServiceError::Validation(
                "Content must not be empty".to_string(),
            ));
        }
        if input.author_name.trim().is_empty() {
            return Err(VoiceServiceError::Validation(
                "Author name must not be empty".to_string(),
            ));
        }
        if !input.author_email.contains('@') {
            return Err(VoiceServiceError::Validation(format!(
                "Invalid email address: {}",
                input.author_email
            )));
        }

        let slug_source = if input.slug.trim().is_empty() {
            &input.title
        } else {
            &input.slug
        };
        let base_slug = seo::create_slug(slug_source);
        if base_slug.is_empty() {
            return Err(VoiceServiceError::Validation(
                "Title does not produce a usable slug".to_string(),
            ));
        }

        let slug = if dedupe_slug {
            self.dedupe_slug(&base_slug).await?
        } else {
            if self.voices.exists_by_slug(&base_slug).await? {
                return Err(VoiceServiceError::DuplicateSlug(base_slug));
            }
            base_slug
        };

        let now = Utc::now();
        Ok(Voice {
            id: 0,
            excerpt: if input.excerpt.trim().is_empty() {
                seo::excerpt(&input.content)
            } else {
                input.excerpt
            },
            reading_time: seo::reading_time(&input.content),
            slug,
            title: input.title,
            content: input.content,
            category: input.category,
            status,
            author_name: input.author_name,
            author_email: input.author_email,
            author_location: input.author_location,
            author_profession: input.author_profession,
            impact: input.impact,
            published_at: (status == VoiceStatus::Published).then_some(now),
            created_at: now,
            updated_at: now,
            view_count: 0,
            like_count: 0,
        })
    }

    async fn dedupe_slug(&self, base: &str) -> Result<String, VoiceServiceError> {
        if !self.voices.exists_by_slug(base).await? {
            return Ok(base.to_string());
        }
        for n in 2..=MAX_SLUG_ATTEMPTS {
            let candidate = format!("{}-{}", base, n);
            if !self.voices.exists_by_slug(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(VoiceServiceError::DuplicateSlug(base.to_string()))
    }

    /// Get a voice by ID (any status)
    pub async fn get_voice(&self, id: i64) -> Result<Voice, VoiceServiceError> {
        self.voices
            .get_by_id(id)
            .await?
            .ok_or(VoiceServiceError::NotFound(id))
    }

    /// Get a published voice by slug, counting the view
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<Voice, VoiceServiceError> {
        let voice = self
            .voices
            .get_by_slug(slug)
            .await?
            .filter(|v| v.status == VoiceStatus::Published)
            .ok_or(VoiceServiceError::NotFound(0))?;

        self.voices.increment_view_count(voice.id).await?;
        Ok(voice)
    }

    /// List voices for the admin panel (any status, filterable)
    pub async fn list_voices(
        &self,
        filter: &VoiceFilter,
        params: &ListParams,
    ) -> Result<PagedResult<Voice>, VoiceServiceError> {
        let total = self.voices.count(filter).await?;
        let items = self
            .voices
            .list(filter, params.offset(), params.limit())
            .await?;
        Ok(PagedResult::new(items, total, params))
    }

    /// List published voices for the public site, cached per page
    pub async fn list_published(
        &self,
        category: Option<String>,
        params: &ListParams,
    ) -> Result<PagedResult<Voice>, VoiceServiceError> {
        let cache_key = format!(
            "{}list:{}:{}:{}",
            keys::VOICES,
            category.as_deref().unwrap_or("all"),
            params.page,
            params.per_page
        );
        if let Ok(Some(cached)) = self.cache.get::<PagedResult<Voice>>(&cache_key).await {
            return Ok(cached);
        }

        let filter = VoiceFilter {
            status: Some(VoiceStatus::Published),
            category,
            ..Default::default()
        };
        let result = self.list_voices(&filter, params).await?;

        if let Err(e) = self.cache.set(&cache_key, &result, self.cache_ttl).await {
            tracing::warn!("Failed to cache voice list: {}", e);
        }
        Ok(result)
    }

    /// Update a voice.
    ///
    /// Moving to Published stamps `published_at` once; a changed slug is
    /// normalized and checked for uniqueness.
    pub async fn update_voice(
        &self,
        id: i64,
        input: UpdateVoiceInput,
    ) -> Result<Voice, VoiceServiceError> {
        if !input.has_changes() {
            return self.get_voice(id).await;
        }

        let mut voice = self.get_voice(id).await?;
        let content_changed = input.content.is_some();

        if let Some(title) = input.title {
            if title.trim().is_empty() {
                return Err(VoiceServiceError::Validation(
                    "Title must not be empty".to_string(),
                ));
            }
            voice.title = title;
        }
        if let Some(content) = input.content {
            if content.trim().is_empty() {
                return Err(VoiceServiceError::Validation(
                    "Content must not be empty".to_string(),
                ));
            }
            voice.content = content;
        }
        if let Some(slug) = input.slug {
            let normalized = seo::create_slug(&slug);
            if normalized.is_empty() {
                return Err(VoiceServiceError::Validation(format!(
                    "Invalid slug: {}",
                    slug
                )));
            }
            if normalized != voice.slug
                && self
                    .voices
                    .exists_by_slug_excluding(&normalized, id)
                    .await?
            {
                return Err(VoiceServiceError::DuplicateSlug(normalized));
            }
            voice.slug = normalized;
        }
        match input.excerpt {
            Some(excerpt) => voice.excerpt = excerpt,
            None if content_changed => voice.excerpt = seo::excerpt(&voice.content),
            None => {}
        }
        if let Some(category) = input.category {
            voice.category = category;
        }
        if let Some(author_name) = input.author_name {
            voice.author_name = author_name;
        }
        if input.author_location.is_some() {
            voice.author_location = input.author_location;
        }
        if input.author_profession.is_some() {
            voice.author_profession = input.author_profession;
        }
        if input.impact.is_some() {
            voice.impact = input.impact;
        }
        if content_changed {
            voice.reading_time = seo::reading_time(&voice.content);
        }
        if let Some(status) = input.status {
            if status == VoiceStatus::Published && voice.published_at.is_none() {
                voice.published_at = Some(Utc::now());
            }
            voice.status = status;
        }

        self.voices.update(&voice).await?;
        self.invalidate_cache().await;
        self.get_voice(id).await
    }

    /// Publish a pending voice (moderation approve)
    pub async fn approve_voice(&self, id: i64) -> Result<Voice, VoiceServiceError> {
        let voice = self
            .update_voice(
                id,
                UpdateVoiceInput {
                    status: Some(VoiceStatus::Published),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!(voice_id = id, "Voice approved");
        Ok(voice)
    }

    /// Reject a pending voice (moderation decline)
    pub async fn reject_voice(&self, id: i64) -> Result<Voice, VoiceServiceError> {
        let voice = self
            .update_voice(
                id,
                UpdateVoiceInput {
                    status: Some(VoiceStatus::Rejected),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!(voice_id = id, "Voice rejected");
        Ok(voice)
    }

    /// Delete a voice
    pub async fn delete_voice(&self, id: i64) -> Result<(), VoiceServiceError> {
        let voice = self.get_voice(id).await?;
        self.voices.delete(voice.id).await?;
        self.invalidate_cache().await;
        tracing::info!(voice_id = id, "Voice deleted");
        Ok(())
    }

    /// Like a voice, returning the stored like count after the increment
    pub async fn like_voice(&self, id: i64) -> Result<i64, VoiceServiceError> {
        let voice = self.get_voice(id).await?;
        Ok(self.voices.increment_like_count(voice.id).await?)
    }

    /// Count voices with the given status (for the dashboard)
    pub async fn count_by_status(&self, status: VoiceStatus) -> Result<i64, VoiceServiceError> {
        Ok(self.voices.count_by_status(status).await?)
    }

    async fn invalidate_cache(&self) {
        if let Err(e) = self.cache.delete_prefix(keys::VOICES).await {
            tracing::warn!("Failed to invalidate voice cache: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxVoiceRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> VoiceService {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        VoiceService::new(
            SqlxVoiceRepository::boxed(pool),
            Arc::new(MemoryCache::new()),
            Duration::from_secs(60),
        )
    }

    fn input(title: &str) -> CreateVoiceInput {
        CreateVoiceInput {
            title: title.to_string(),
            content: "<p>The floods reached our street last spring.</p>".to_string(),
            slug: String::new(),
            excerpt: String::new(),
            category: "personal".to_string(),
            author_name: "Deniz Kaya".to_string(),
            author_email: "deniz@example.org".to_string(),
            author_location: Some("Ankara".to_string()),
            author_profession: None,
            impact: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_public_submission_is_always_pending() {
        let service = setup().await;
        let mut submitted = input("My Story");
        submitted.status = Some(VoiceStatus::Published); // must be ignored

        let voice = service.submit_voice(submitted).await.unwrap();
        assert_eq!(voice.status, VoiceStatus::Pending);
        assert!(voice.published_at.is_none());
    }

    #[tokio::test]
    async fn test_public_submission_dedupes_slug() {
        let service = setup().await;
        let first = service.submit_voice(input("Same Story")).await.unwrap();
        let second = service.submit_voice(input("Same Story")).await.unwrap();

        assert_eq!(first.slug, "same-story");
        assert_eq!(second.slug, "same-story-2");
    }

    #[tokio::test]
    async fn test_admin_create_duplicate_slug_rejected() {
        let service = setup().await;
        service.create_voice(input("Same Story")).await.unwrap();

        let err = service.create_voice(input("Same Story")).await.unwrap_err();
        assert!(matches!(err, VoiceServiceError::DuplicateSlug(_)));
    }

    #[tokio::test]
    async fn test_submission_requires_valid_email() {
        let service = setup().await;
        let mut bad = input("Story");
        bad.author_email = "not-an-email".to_string();

        let err = service.submit_voice(bad).await.unwrap_err();
        assert!(matches!(err, VoiceServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_approve_publishes_voice() {
        let service = setup().await;
        let voice = service.submit_voice(input("Pending Story")).await.unwrap();

        let approved = service.approve_voice(voice.id).await.unwrap();
        assert_eq!(approved.status, VoiceStatus::Published);
        assert!(approved.published_at.is_some());
    }

    #[tokio::test]
    async fn test_reject_voice() {
        let service = setup().await;
        let voice = service.submit_voice(input("Bad Story")).await.unwrap();

        let rejected = service.reject_voice(voice.id).await.unwrap();
        assert_eq!(rejected.status, VoiceStatus::Rejected);
        assert!(rejected.published_at.is_none());
    }

    #[tokio::test]
    async fn test_public_list_shows_only_published() {
        let service = setup().await;
        service.submit_voice(input("Pending One")).await.unwrap();
        let voice = service.submit_voice(input("Approved One")).await.unwrap();
        service.approve_voice(voice.id).await.unwrap();

        let page = service
            .list_published(None, &ListParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].slug, "approved-one");
    }

    #[tokio::test]
    async fn test_get_published_by_slug_hides_pending() {
        let service = setup().await;
        let voice = service.submit_voice(input("Still Pending")).await.unwrap();

        let err = service.get_published_by_slug(&voice.slug).await.unwrap_err();
        assert!(matches!(err, VoiceServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_moderation_invalidates_public_cache() {
        let service = setup().await;
        let voice = service.submit_voice(input("Story A")).await.unwrap();
        service.approve_voice(voice.id).await.unwrap();

        // Prime the cache, then publish another story
        let page = service
            .list_published(None, &ListParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);

        let other = service.submit_voice(input("Story B")).await.unwrap();
        service.approve_voice(other.id).await.unwrap();

        let page = service
            .list_published(None, &ListParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_like_voice() {
        let service = setup().await;
        let voice = service.submit_voice(input("Liked Story")).await.unwrap();
        assert_eq!(service.like_voice(voice.id).await.unwrap(), 1);
        assert_eq!(service.like_voice(voice.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_voice() {
        let service = setup().await;
        let voice = service.submit_voice(input("Doomed")).await.unwrap();
        service.delete_voice(voice.id).await.unwrap();
        assert!(matches!(
            service.get_voice(voice.id).await.unwrap_err(),
            VoiceServiceError::NotFound(_)
        ));
    }
}
