//! Blog post repository
//!
//! Database operations for blog posts. Tags are stored as a JSON array in
//! the `tags` column. List queries accept a `PostFilter`; the sort column
//! comes from a closed enum so user input never reaches the SQL text.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{BlogPost, PostFilter, PostStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Blog post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a new post; returns the stored record with its id
    async fn create(&self, post: &BlogPost) -> Result<BlogPost>;

    /// Get post by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<BlogPost>>;

    /// Get post by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>>;

    /// List posts matching the filter, with pagination
    async fn list(&self, filter: &PostFilter, offset: i64, limit: i64) -> Result<Vec<BlogPost>>;

    /// Count posts matching the filter
    async fn count(&self, filter: &PostFilter) -> Result<i64>;

    /// Count posts with the given status
    async fn count_by_status(&self, status: PostStatus) -> Result<i64>;

    /// Persist the mutable fields of an existing post
    async fn update(&self, post: &BlogPost) -> Result<()>;

    /// Delete a post
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check if a slug already exists
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Check if a slug exists for a different post (for updates)
    async fn exists_by_slug_excluding(&self, slug: &str, exclude_id: i64) -> Result<bool>;

    /// Increment the view counter
    async fn increment_view_count(&self, id: i64) -> Result<()>;

    /// Increment the like counter, returning the stored count after the
    /// update so concurrent likes are reflected
    async fn increment_like_count(&self, id: i64) -> Result<i64>;
}

/// SQLx-based post repository supporting SQLite and MySQL
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    /// Create a new SQLx post repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &BlogPost) -> Result<BlogPost> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_post_sqlite(self.pool.as_sqlite().unwrap(), post).await,
            DatabaseDriver::Mysql => create_post_mysql(self.pool.as_mysql().unwrap(), post).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogPost>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_post_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_post_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_post_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => {
                get_post_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await
            }
        }
    }

    async fn list(&self, filter: &PostFilter, offset: i64, limit: i64) -> Result<Vec<BlogPost>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_posts_sqlite(self.pool.as_sqlite().unwrap(), filter, offset, limit).await
            }
            DatabaseDriver::Mysql => {
                list_posts_mysql(self.pool.as_mysql().unwrap(), filter, offset, limit).await
            }
        }
    }

    async fn count(&self, filter: &PostFilter) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_posts_sqlite(self.pool.as_sqlite().unwrap(), filter).await
            }
            DatabaseDriver::Mysql => count_posts_mysql(self.pool.as_mysql().unwrap(), filter).await,
        }
    }

    async fn count_by_status(&self, status: PostStatus) -> Result<i64> {
        let filter = PostFilter {
            status: Some(status),
            ..Default::default()
        };
        self.count(&filter).await
    }

    async fn update(&self, post: &BlogPost) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_post_sqlite(self.pool.as_sqlite().unwrap(), post).await,
            DatabaseDriver::Mysql => update_post_mysql(self.pool.as_mysql().unwrap(), post).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_post_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_post_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                exists_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug, None).await
            }
            DatabaseDriver::Mysql => {
                exists_by_slug_mysql(self.pool.as_mysql().unwrap(), slug, None).await
            }
        }
    }

    async fn exists_by_slug_excluding(&self, slug: &str, exclude_id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                exists_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug, Some(exclude_id)).await
            }
            DatabaseDriver::Mysql => {
                exists_by_slug_mysql(self.pool.as_mysql().unwrap(), slug, Some(exclude_id)).await
            }
        }
    }

    async fn increment_view_count(&self, id: i64) -> Result<()> {
        let sql = "UPDATE posts SET view_count = view_count + 1 WHERE id = ?";
        increment_counter(&self.pool, sql, id).await
    }

    async fn increment_like_count(&self, id: i64) -> Result<i64> {
        let update = "UPDATE posts SET like_count = like_count + 1 WHERE id = ?";
        let select = "SELECT like_count FROM posts WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let pool = self.pool.as_sqlite().unwrap();
                sqlx::query(update)
                    .bind(id)
                    .execute(pool)
                    .await
                    .context("Failed to increment like count")?;
                let row = sqlx::query(select)
                    .bind(id)
                    .fetch_one(pool)
                    .await
                    .context("Failed to read like count")?;
                Ok(row.get("like_count"))
            }
            DatabaseDriver::Mysql => {
                let pool = self.pool.as_mysql().unwrap();
                sqlx::query(update)
                    .bind(id)
                    .execute(pool)
                    .await
                    .context("Failed to increment like count")?;
                let row = sqlx::query(select)
                    .bind(id)
                    .fetch_one(pool)
                    .await
                    .context("Failed to read like count")?;
                Ok(row.get("like_count"))
            }
        }
    }
}

async fn increment_counter(pool: &DynDatabasePool, sql: &str, id: i64) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => {
            sqlx::query(sql)
                .bind(id)
                .execute(pool.as_sqlite().unwrap())
                .await
                .context("Failed to increment counter")?;
        }
        DatabaseDriver::Mysql => {
            sqlx::query(sql)
                .bind(id)
                .execute(pool.as_mysql().unwrap())
                .await
                .context("Failed to increment counter")?;
        }
    }
    Ok(())
}

const POST_COLUMNS: &str = "id, slug, title, content, excerpt, category, tags, author_id, status, meta_title, meta_description, reading_time, published_at, created_at, updated_at, view_count, like_count";

/// WHERE clause and string bind values for a filter; conditions and binds
/// are produced in the same fixed order (status, category, search).
fn filter_clause(filter: &PostFilter) -> (String, Vec<String>) {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    if let Some(status) = filter.status {
        conditions.push("status = ?");
        binds.push(status.as_str().to_string());
    }
    if let Some(category) = &filter.category {
        conditions.push("category = ?");
        binds.push(category.clone());
    }
    if let Some(search) = &filter.search {
        conditions.push("(title LIKE ? OR content LIKE ?)");
        let pattern = format!("%{}%", search);
        binds.push(pattern.clone());
        binds.push(pattern);
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    (clause, binds)
}

fn list_query(filter: &PostFilter) -> (String, Vec<String>) {
    let (clause, binds) = filter_clause(filter);
    let sql = format!(
        "SELECT {} FROM posts{} ORDER BY {} {} LIMIT ? OFFSET ?",
        POST_COLUMNS,
        clause,
        filter.sort_by.as_column(),
        filter.sort_dir.as_sql(),
    );
    (sql, binds)
}

fn count_query(filter: &PostFilter) -> (String, Vec<String>) {
    let (clause, binds) = filter_clause(filter);
    (
        format!("SELECT COUNT(*) as count FROM posts{}", clause),
        binds,
    )
}

fn tags_to_json(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

fn row_to_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<BlogPost> {
    let status_str: String = row.get("status");
    let status = PostStatus::from_str(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid post status: {}", status_str))?;
    let tags_raw: String = row.get("tags");

    Ok(BlogPost {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        content: row.get("content"),
        excerpt: row.get("excerpt"),
        category: row.get("category"),
        tags: serde_json::from_str(&tags_raw).unwrap_or_default(),
        author_id: row.get("author_id"),
        status,
        meta_title: row.get("meta_title"),
        meta_description: row.get("meta_description"),
        reading_time: row.get("reading_time"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        view_count: row.try_get("view_count").unwrap_or(0),
        like_count: row.try_get("like_count").unwrap_or(0),
    })
}

fn row_to_post_mysql(row: &sqlx::mysql::MySqlRow) -> Result<BlogPost> {
    let status_str: String = row.get("status");
    let status = PostStatus::from_str(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid post status: {}", status_str))?;
    let tags_raw: String = row.get("tags");

    Ok(BlogPost {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        content: row.get("content"),
        excerpt: row.get("excerpt"),
        category: row.get("category"),
        tags: serde_json::from_str(&tags_raw).unwrap_or_default(),
        author_id: row.get("author_id"),
        status,
        meta_title: row.get("meta_title"),
        meta_description: row.get("meta_description"),
        reading_time: row.get("reading_time"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        view_count: row.try_get("view_count").unwrap_or(0),
        like_count: row.try_get("like_count").unwrap_or(0),
    })
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_post_sqlite(pool: &SqlitePool, post: &BlogPost) -> Result<BlogPost> {
    let result = sqlx::query(
        r#"
        INSERT INTO posts (slug, title, content, excerpt, category, tags, author_id, status, meta_title, meta_description, reading_time, published_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&post.slug)
    .bind(&post.title)
    .bind(&post.content)
    .bind(&post.excerpt)
    .bind(&post.category)
    .bind(tags_to_json(&post.tags))
    .bind(post.author_id)
    .bind(post.status.as_str())
    .bind(&post.meta_title)
    .bind(&post.meta_description)
    .bind(post.reading_time)
    .bind(post.published_at)
    .bind(post.created_at)
    .bind(post.updated_at)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    let mut created = post.clone();
    created.id = result.last_insert_rowid();
    Ok(created)
}

async fn get_post_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<BlogPost>> {
    let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by ID")?;

    row.as_ref().map(row_to_post_sqlite).transpose()
}

async fn get_post_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<BlogPost>> {
    let row = sqlx::query(&format!("SELECT {} FROM posts WHERE slug = ?", POST_COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by slug")?;

    row.as_ref().map(row_to_post_sqlite).transpose()
}

async fn list_posts_sqlite(
    pool: &SqlitePool,
    filter: &PostFilter,
    offset: i64,
    limit: i64,
) -> Result<Vec<BlogPost>> {
    let (sql, binds) = list_query(filter);
    let mut query = sqlx::query(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    let rows = query
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;

    rows.iter().map(row_to_post_sqlite).collect()
}

async fn count_posts_sqlite(pool: &SqlitePool, filter: &PostFilter) -> Result<i64> {
    let (sql, binds) = count_query(filter);
    let mut query = sqlx::query(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    let row = query.fetch_one(pool).await.context("Failed to count posts")?;
    Ok(row.get("count"))
}

async fn update_post_sqlite(pool: &SqlitePool, post: &BlogPost) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE posts
        SET slug = ?, title = ?, content = ?, excerpt = ?, category = ?, tags = ?, status = ?, meta_title = ?, meta_description = ?, reading_time = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&post.slug)
    .bind(&post.title)
    .bind(&post.content)
    .bind(&post.excerpt)
    .bind(&post.category)
    .bind(tags_to_json(&post.tags))
    .bind(post.status.as_str())
    .bind(&post.meta_title)
    .bind(&post.meta_description)
    .bind(post.reading_time)
    .bind(post.published_at)
    .bind(Utc::now())
    .bind(post.id)
    .execute(pool)
    .await
    .context("Failed to update post")?;

    Ok(())
}

async fn delete_post_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete post")?;
    Ok(())
}

async fn exists_by_slug_sqlite(
    pool: &SqlitePool,
    slug: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let row = match exclude_id {
        Some(id) => {
            sqlx::query("SELECT COUNT(*) as count FROM posts WHERE slug = ? AND id != ?")
                .bind(slug)
                .bind(id)
                .fetch_one(pool)
                .await
        }
        None => {
            sqlx::query("SELECT COUNT(*) as count FROM posts WHERE slug = ?")
                .bind(slug)
                .fetch_one(pool)
                .await
        }
    }
    .context("Failed to check slug existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_post_mysql(pool: &MySqlPool, post: &BlogPost) -> Result<BlogPost> {
    let result = sqlx::query(
        r#"
        INSERT INTO posts (slug, title, content, excerpt, category, tags, author_id, status, meta_title, meta_description, reading_time, published_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&post.slug)
    .bind(&post.title)
    .bind(&post.content)
    .bind(&post.excerpt)
    .bind(&post.category)
    .bind(tags_to_json(&post.tags))
    .bind(post.author_id)
    .bind(post.status.as_str())
    .bind(&post.meta_title)
    .bind(&post.meta_description)
    .bind(post.reading_time)
    .bind(post.published_at)
    .bind(post.created_at)
    .bind(post.updated_at)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    let mut created = post.clone();
    created.id = result.last_insert_id() as i64;
    Ok(created)
}

async fn get_post_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<BlogPost>> {
    let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by ID")?;

    row.as_ref().map(row_to_post_mysql).transpose()
}

async fn get_post_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<BlogPost>> {
    let row = sqlx::query(&format!("SELECT {} FROM posts WHERE slug = ?", POST_COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by slug")?;

    row.as_ref().map(row_to_post_mysql).transpose()
}

async fn list_posts_mysql(
    pool: &MySqlPool,
    filter: &PostFilter,
    offset: i64,
    limit: i64,
) -> Result<Vec<BlogPost>> {
    let (sql, binds) = list_query(filter);
    let mut query = sqlx::query(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    let rows = query
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;

    rows.iter().map(row_to_post_mysql).collect()
}

async fn count_posts_mysql(pool: &MySqlPool, filter: &PostFilter) -> Result<i64> {
    let (sql, binds) = count_query(filter);
    let mut query = sqlx::query(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    let row = query.fetch_one(pool).await.context("Failed to count posts")?;
    Ok(row.get("count"))
}

async fn update_post_mysql(pool: &MySqlPool, post: &BlogPost) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE posts
        SET slug = ?, title = ?, content = ?, excerpt = ?, category = ?, tags = ?, status = ?, meta_title = ?, meta_description = ?, reading_time = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&post.slug)
    .bind(&post.title)
    .bind(&post.content)
    .bind(&post.excerpt)
    .bind(&post.category)
    .bind(tags_to_json(&post.tags))
    .bind(post.status.as_str())
    .bind(&post.meta_title)
    .bind(&post.meta_description)
    .bind(post.reading_time)
    .bind(post.published_at)
    .bind(Utc::now())
    .bind(post.id)
    .execute(pool)
    .await
    .context("Failed to update post")?;

    Ok(())
}

async fn delete_post_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete post")?;
    Ok(())
}

async fn exists_by_slug_mysql(
    pool: &MySqlPool,
    slug: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let row = match exclude_id {
        Some(id) => {
            sqlx::query("SELECT COUNT(*) as count FROM posts WHERE slug = ? AND id != ?")
                .bind(slug)
                .bind(id)
                .fetch_one(pool)
                .await
        }
        None => {
            sqlx::query("SELECT COUNT(*) as count FROM posts WHERE slug = ?")
                .bind(slug)
                .fetch_one(pool)
                .await
        }
    }
    .context("Failed to check slug existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}
