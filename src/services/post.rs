//! Blog post service
//!
//! Business logic for blog posts: slug and SEO derivation, publication
//! state transitions, and cache invalidation for the public read paths.

use crate::cache::{keys, CacheLayer, MemoryCache};
use crate::db::repositories::PostRepository;
use crate::models::{
    BlogPost, CreatePostInput, ListParams, PagedResult, PostFilter, PostStatus, UpdatePostInput,
};
use crate::services::seo;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Blog post service errors
#[derive(Debug, Error)]
pub enum PostServiceError {
    /// Post not found
    #[error("Post not found: {0}")]
    NotFound(i64),

    /// Slug already in use by another post
    #[error("Slug already exists: {0}")]
    DuplicateSlug(String),

    /// Input validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Blog post service
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    cache: Arc<MemoryCache>,
    cache_ttl: Duration,
}

impl PostService {
    /// Create a new post service
    pub fn new(posts: Arc<dyn PostRepository>, cache: Arc<MemoryCache>, cache_ttl: Duration) -> Self {
        Self {
            posts,
            cache,
            cache_ttl,
        }
    }

    /// Create a blog post.
    ///
    /// Missing slug, excerpt, meta title, and meta description are derived;
    /// reading time is always derived. An explicit slug is normalized
    /// through the same rules as a derived one.
    pub async fn create_post(&self, input: CreatePostInput) -> Result<BlogPost, PostServiceError> {
        if input.title.trim().is_empty() {
            return Err(PostServiceError::Validation(
                "Title must not be empty".to_string(),
            ));
        }
        if input.content.trim().is_empty() {
            return Err(PostServiceError::Validation(
                "Content must not be empty".to_string(),
            ));
        }

        let slug_source = if input.slug.trim().is_empty() {
            &input.title
        } else {
            &input.slug
        };
        let slug = seo::create_slug(slug_source);
        if slug.is_empty() {
            return Err(PostServiceError::Validation(
                "Title does not produce a usable slug".to_string(),
            ));
        }
        if self.posts.exists_by_slug(&slug).await? {
            return Err(PostServiceError::DuplicateSlug(slug));
        }

        let status = input.status.unwrap_or_default();
        let now = Utc::now();
        let post = BlogPost {
            id: 0,
            excerpt: if input.excerpt.trim().is_empty() {
                seo::excerpt(&input.content)
            } else {
                input.excerpt
            },
            meta_title: input.meta_title.unwrap_or_else(|| input.title.clone()),
            meta_description: input
                .meta_description
                .unwrap_or_else(|| seo::meta_description(&input.content)),
            reading_time: seo::reading_time(&input.content),
            slug,
            title: input.title,
            content: input.content,
            category: input.category,
            tags: input.tags,
            author_id: input.author_id,
            status,
            published_at: (status == PostStatus::Published).then_some(now),
            created_at: now,
            updated_at: now,
            view_count: 0,
            like_count: 0,
        };

        let created = self.posts.create(&post).await?;
        self.invalidate_cache().await;
        tracing::info!(post_id = created.id, slug = %created.slug, "Post created");
        Ok(created)
    }

    /// Get a post by ID (any status)
    pub async fn get_post(&self, id: i64) -> Result<BlogPost, PostServiceError> {
        self.posts
            .get_by_id(id)
            .await?
            .ok_or(PostServiceError::NotFound(id))
    }

    /// Get a published post by slug, counting the view.
    ///
    /// Drafts and archived posts are invisible here.
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<BlogPost, PostServiceError> {
        let post = self
            .posts
            .get_by_slug(slug)
            .await?
            .filter(|p| p.status == PostStatus::Published)
            .ok_or(PostServiceError::NotFound(0))?;

        self.posts.increment_view_count(post.id).await?;
        Ok(post)
    }

    /// List posts for the admin panel (any status, filterable)
    pub async fn list_posts(
        &self,
        filter: &PostFilter,
        params: &ListParams,
    ) -> Result<PagedResult<BlogPost>, PostServiceError> {
        let total = self.posts.count(filter).await?;
        let items = self
            .posts
            .list(filter, params.offset(), params.limit())
            .await?;
        Ok(PagedResult::new(items, total, params))
    }

    /// List published posts for the public site, cached per page
    pub async fn list_published(
        &self,
        category: Option<String>,
        params: &ListParams,
    ) -> Result<PagedResult<BlogPost>, PostServiceError> {
        let cache_key = format!(
            "{}list:{}:{}:{}",
            keys::POSTS,
            category.as_deref().unwrap_or("all"),
            params.page,
            params.per_page
        );
        if let Ok(Some(cached)) = self.cache.get::<PagedResult<BlogPost>>(&cache_key).await {
            return Ok(cached);
        }

        let filter = PostFilter {
            status: Some(PostStatus::Published),
            category,
            ..Default::default()
        };
        let result = self.list_posts(&filter, params).await?;

        if let Err(e) = self.cache.set(&cache_key, &result, self.cache_ttl).await {
            tracing::warn!("Failed to cache post list: {}", e);
        }
        Ok(result)
    }

    /// Update a post.
    ///
    /// A changed slug is normalized and checked for uniqueness. Changing
    /// the content re-derives reading time always, and excerpt/meta
    /// description only when the update doesn't set them explicitly.
    /// Publishing a post stamps `published_at` once.
    pub async fn update_post(
        &self,
        id: i64,
        input: UpdatePostInput,
    ) -> Result<BlogPost, PostServiceError> {
        if !input.has_changes() {
            return self.get_post(id).await;
        }

        let mut post = self.get_post(id).await?;
        let content_changed = input.content.is_some();

        if let Some(title) = input.title {
            if title.trim().is_empty() {
                return Err(PostServiceError::Validation(
                    "Title must not be empty".to_string(),
                ));
            }
            post.title = title;
        }
        if let Some(content) = input.content {
            if content.trim().is_empty() {
                return Err(PostServiceError::Validation(
                    "Content must not be empty".to_string(),
                ));
            }
            post.content = content;
        }
        if let Some(slug) = input.slug {
            let normalized = seo::create_slug(&slug);
            if normalized.is_empty() {
                return Err(PostServiceError::Validation(format!(
                    "Invalid slug: {}",
                    slug
                )));
            }
            if normalized != post.slug
                && self.posts.exists_by_slug_excluding(&normalized, id).await?
            {
                return Err(PostServiceError::DuplicateSlug(normalized));
            }
            post.slug = normalized;
        }
        match input.excerpt {
            Some(excerpt) => post.excerpt = excerpt,
            None if content_changed => post.excerpt = seo::excerpt(&post.content),
            None => {}
        }
        if let Some(category) = input.category {
            post.category = category;
        }
        if let Some(tags) = input.tags {
            post.tags = tags;
        }
        if let Some(meta_title) = input.meta_title {
            post.meta_title = meta_title;
        }
        match input.meta_description {
            Some(desc) => post.meta_description = desc,
            None if content_changed => {
                post.meta_description = seo::meta_description(&post.content)
            }
            None => {}
        }
        if content_changed {
            post.reading_time = seo::reading_time(&post.content);
        }
        if let Some(status) = input.status {
            if status == PostStatus::Published && post.published_at.is_none() {
                post.published_at = Some(Utc::now());
            }
            post.status = status;
        }

        self.posts.update(&post).await?;
        self.invalidate_cache().await;
        self.get_post(id).await
    }

    /// Delete a post
    pub async fn delete_post(&self, id: i64) -> Result<(), PostServiceError> {
        let post = self.get_post(id).await?;
        self.posts.delete(post.id).await?;
        self.invalidate_cache().await;
        tracing::info!(post_id = id, "Post deleted");
        Ok(())
    }

    /// Like a post, returning the stored like count after the increment
    pub async fn like_post(&self, id: i64) -> Result<i64, PostServiceError> {
        let post = self.get_post(id).await?;
        Ok(self.posts.increment_like_count(post.id).await?)
    }

    /// Count posts with the given status (for the dashboard)
    pub async fn count_by_status(&self, status: PostStatus) -> Result<i64, PostServiceError> {
        Ok(self.posts.count_by_status(status).await?)
    }

    async fn invalidate_cache(&self) {
        if let Err(e) = self.cache.delete_prefix(keys::POSTS).await {
            tracing::warn!("Failed to invalidate post cache: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxPostRepository, SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{AdminUser, UserRole};

    async fn setup() -> (PostService, i64) {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();

        let users = SqlxUserRepository::new(pool.clone());
        let author = users
            .create(&AdminUser::new(
                "editor@beyond2c.org".to_string(),
                "Editor".to_string(),
                "hash".to_string(),
                UserRole::Editor,
            ))
            .await
            .unwrap();

        let service = PostService::new(
            SqlxPostRepository::boxed(pool),
            Arc::new(MemoryCache::new()),
            Duration::from_secs(60),
        );
        (service, author.id)
    }

    fn input(title: &str, author_id: i64) -> CreatePostInput {
        CreatePostInput {
            title: title.to_string(),
            content: "<p>We need climate action now, not in a decade.</p>".to_string(),
            slug: String::new(),
            excerpt: String::new(),
            category: "opinion".to_string(),
            tags: vec![],
            author_id,
            status: None,
            meta_title: None,
            meta_description: None,
        }
    }

    #[tokio::test]
    async fn test_create_derives_seo_fields() {
        let (service, author_id) = setup().await;
        let post = service
            .create_post(input("İklim Krizi ve Biz", author_id))
            .await
            .unwrap();

        assert_eq!(post.slug, "iklim-krizi-ve-biz");
        assert_eq!(post.meta_title, "İklim Krizi ve Biz");
        assert_eq!(
            post.meta_description,
            "We need climate action now, not in a decade."
        );
        assert_eq!(post.excerpt, "We need climate action now, not in a decade.");
        assert_eq!(post.reading_time, 1);
        assert_eq!(post.status, PostStatus::Draft);
        assert!(post.published_at.is_none());
    }

    #[tokio::test]
    async fn test_create_published_sets_timestamp() {
        let (service, author_id) = setup().await;
        let mut create = input("Published now", author_id);
        create.status = Some(PostStatus::Published);

        let post = service.create_post(create).await.unwrap();
        assert!(post.published_at.is_some());
    }

    #[tokio::test]
    async fn test_create_duplicate_slug_rejected() {
        let (service, author_id) = setup().await;
        service.create_post(input("Same Title", author_id)).await.unwrap();

        let err = service
            .create_post(input("Same Title", author_id))
            .await
            .unwrap_err();
        assert!(matches!(err, PostServiceError::DuplicateSlug(_)));
    }

    #[tokio::test]
    async fn test_create_empty_title_rejected() {
        let (service, author_id) = setup().await;
        let err = service.create_post(input("   ", author_id)).await.unwrap_err();
        assert!(matches!(err, PostServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_publishing_stamps_published_at_once() {
        let (service, author_id) = setup().await;
        let post = service.create_post(input("Draft first", author_id)).await.unwrap();

        let published = service
            .update_post(
                post.id,
                UpdatePostInput {
                    status: Some(PostStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let first_published_at = published.published_at.unwrap();

        // Archive and re-publish; the original timestamp is kept
        service
            .update_post(
                post.id,
                UpdatePostInput {
                    status: Some(PostStatus::Archived),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let republished = service
            .update_post(
                post.id,
                UpdatePostInput {
                    status: Some(PostStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(republished.published_at.unwrap(), first_published_at);
    }

    #[tokio::test]
    async fn test_content_change_rederives_fields() {
        let (service, author_id) = setup().await;
        let post = service.create_post(input("Original", author_id)).await.unwrap();

        let long_content = format!("<p>{}</p>", "word ".repeat(450));
        let updated = service
            .update_post(
                post.id,
                UpdatePostInput {
                    content: Some(long_content),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.reading_time, 3);
        assert!(updated.meta_description.chars().count() <= 160);
    }

    #[tokio::test]
    async fn test_get_published_by_slug_hides_drafts() {
        let (service, author_id) = setup().await;
        let post = service.create_post(input("Hidden draft", author_id)).await.unwrap();

        let err = service.get_published_by_slug(&post.slug).await.unwrap_err();
        assert!(matches!(err, PostServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_published_by_slug_counts_view() {
        let (service, author_id) = setup().await;
        let mut create = input("Visible", author_id);
        create.status = Some(PostStatus::Published);
        let post = service.create_post(create).await.unwrap();

        service.get_published_by_slug(&post.slug).await.unwrap();
        service.get_published_by_slug(&post.slug).await.unwrap();

        let fetched = service.get_post(post.id).await.unwrap();
        assert_eq!(fetched.view_count, 2);
    }

    #[tokio::test]
    async fn test_list_published_excludes_drafts() {
        let (service, author_id) = setup().await;
        service.create_post(input("A draft", author_id)).await.unwrap();

        let mut create = input("A published one", author_id);
        create.status = Some(PostStatus::Published);
        service.create_post(create).await.unwrap();

        let page = service
            .list_published(None, &ListParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].slug, "a-published-one");
    }

    #[tokio::test]
    async fn test_list_published_cache_invalidated_on_create() {
        let (service, author_id) = setup().await;
        let mut create = input("First", author_id);
        create.status = Some(PostStatus::Published);
        service.create_post(create).await.unwrap();

        // Prime the cache
        let page = service
            .list_published(None, &ListParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);

        let mut create = input("Second", author_id);
        create.status = Some(PostStatus::Published);
        service.create_post(create).await.unwrap();

        let page = service
            .list_published(None, &ListParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_like_post() {
        let (service, author_id) = setup().await;
        let post = service.create_post(input("Likeable", author_id)).await.unwrap();

        assert_eq!(service.like_post(post.id).await.unwrap(), 1);
        assert_eq!(service.like_post(post.id).await.unwrap(), 2);
        let fetched = service.get_post(post.id).await.unwrap();
        assert_eq!(fetched.like_count, 2);
    }

    #[tokio::test]
    async fn test_delete_post() {
        let (service, author_id) = setup().await;
        let post = service.create_post(input("Doomed", author_id)).await.unwrap();

        service.delete_post(post.id).await.unwrap();
        assert!(matches!(
            service.get_post(post.id).await.unwrap_err(),
            PostServiceError::NotFound(_)
        ));
    }
}
