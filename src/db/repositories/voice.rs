//! Voice repository
//!
//! Database operations for submitted climate stories. The shape mirrors the
//! post repository; voices carry author metadata instead of an admin author
//! and their search filter also matches the author name.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Voice, VoiceFilter, VoiceStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Voice repository trait
#[async_trait]
pub trait VoiceRepository: Send + Sync {
    /// Create a new voice; returns the stored record with its id
    async fn create(&self, voice: &Voice) -> Result<Voice>;

    /// Get voice by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Voice>>;

    /// Get voice by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Voice>>;

    /// List voices matching the filter, with pagination
    async fn list(&self, filter: &VoiceFilter, offset: i64, limit: i64) -> Result<Vec<Voice>>;

    /// Count voices matching the filter
    async fn count(&self, filter: &VoiceFilter) -> Result<i64>;

    /// Count voices with the given status
    async fn count_by_status(&self, status: VoiceStatus) -> Result<i64>;

    /// Persist the mutable fields of an existing voice
    async fn update(&self, voice: &Voice) -> Result<()>;

    /// Delete a voice
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check if a slug already exists
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Check if a slug exists for a different voice (for updates)
    async fn exists_by_slug_excluding(&self, slug: &str, exclude_id: i64) -> Result<bool>;

    /// Increment the view counter
    async fn increment_view_count(&self, id: i64) -> Result<()>;

    /// Increment the like counter, returning the stored count after the
    /// update so concurrent likes are reflected
    async fn increment_like_count(&self, id: i64) -> Result<i64>;
}

/// SQLx-based voice repository supporting SQLite and MySQL
pub struct SqlxVoiceRepository {
    pool: DynDatabasePool,
}

impl SqlxVoiceRepository {
    /// Create a new SQLx voice repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn VoiceRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl VoiceRepository for SqlxVoiceRepository {
    async fn create(&self, voice: &Voice) -> Result<Voice> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_voice_sqlite(self.pool.as_sqlite().unwrap(), voice).await
            }
            DatabaseDriver::Mysql => create_voice_mysql(self.pool.as_mysql().unwrap(), voice).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Voice>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_voice_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_voice_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Voice>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_voice_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => {
                get_voice_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await
            }
        }
    }

    async fn list(&self, filter: &VoiceFilter, offset: i64, limit: i64) -> Result<Vec<Voice>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_voices_sqlite(self.pool.as_sqlite().unwrap(), filter, offset, limit).await
            }
            DatabaseDriver::Mysql => {
                list_voices_mysql(self.pool.as_mysql().unwrap(), filter, offset, limit).await
            }
        }
    }

    async fn count(&self, filter: &VoiceFilter) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_voices_sqlite(self.pool.as_sqlite().unwrap(), filter).await
            }
            DatabaseDriver::Mysql => {
                count_voices_mysql(self.pool.as_mysql().unwrap(), filter).await
            }
        }
    }

    async fn count_by_status(&self, status: VoiceStatus) -> Result<i64> {
        let filter = VoiceFilter {
            status: Some(status),
            ..Default::default()
        };
        self.count(&filter).await
    }

    async fn update(&self, voice: &Voice) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_voice_sqlite(self.pool.as_sqlite().unwrap(), voice).await
            }
            DatabaseDriver::Mysql => update_voice_mysql(self.pool.as_mysql().unwrap(), voice).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_voice_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_voice_mysql(self.pool.as_mysql().unwrap(), id).await,
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
        let sql = "UPDATE voices SET view_count = view_count + 1 WHERE id = ?";
        increment_counter(&self.pool, sql, id).await
    }

    async fn increment_like_count(&self, id: i64) -> Result<i64> {
        let update = "UPDATE voices SET like_count = like_count + 1 WHERE id = ?";
        let select = "SELECT like_count FROM voices WHERE id = ?";
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

const VOICE_COLUMNS: &str = "id, slug, title, content, excerpt, category, status, author_name, author_email, author_location, author_profession, impact, reading_time, published_at, created_at, updated_at, view_count, like_count";

fn filter_clause(filter: &VoiceFilter) -> (String, Vec<String>) {
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
        conditions.push("(title LIKE ? OR content LIKE ? OR author_name LIKE ?)");
        let pattern = format!("%{}%", search);
        binds.push(pattern.clone());
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

fn list_query(filter: &VoiceFilter) -> (String, Vec<String>) {
    let (clause, binds) = filter_clause(filter);
    let sql = format!(
        "SELECT {} FROM voices{} ORDER BY {} {} LIMIT ? OFFSET ?",
        VOICE_COLUMNS,
        clause,
        filter.sort_by.as_column(),
        filter.sort_dir.as_sql(),
    );
    (sql, binds)
}

fn count_query(filter: &VoiceFilter) -> (String, Vec<String>) {
    let (clause, binds) = filter_clause(filter);
    (
        format!("SELECT COUNT(*) as count FROM voices{}", clause),
        binds,
    )
}

fn row_to_voice_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Voice> {
    let status_str: String = row.get("status");
    let status = VoiceStatus::from_str(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid voice status: {}", status_str))?;

    Ok(Voice {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        content: row.get("content"),
        excerpt: row.get("excerpt"),
        category: row.get("category"),
        status,
        author_name: row.get("author_name"),
        author_email: row.get("author_email"),
        author_location: row.get("author_location"),
        author_profession: row.get("author_profession"),
        impact: row.get("impact"),
        reading_time: row.get("reading_time"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        view_count: row.try_get("view_count").unwrap_or(0),
        like_count: row.try_get("like_count").unwrap_or(0),
    })
}

fn row_to_voice_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Voice> {
    let status_str: String = row.get("status");
    let status = VoiceStatus::from_str(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid voice status: {}", status_str))?;

    Ok(Voice {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        content: row.get("content"),
        excerpt: row.get("excerpt"),
        category: row.get("category"),
        status,
        author_name: row.get("author_name"),
        author_email: row.get("author_email"),
        author_location: row.get("author_location"),
        author_profession: row.get("author_profession"),
        impact: row.get("impact"),
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

async fn create_voice_sqlite(pool: &SqlitePool, voice: &Voice) -> Result<Voice> {
    let result = sqlx::query(
        r#"
        INSERT INTO voices (slug, title, content, excerpt, category, status, author_name, author_email, author_location, author_profession, impact, reading_time, published_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&voice.slug)
    .bind(&voice.title)
    .bind(&voice.content)
    .bind(&voice.excerpt)
    .bind(&voice.category)
    .bind(voice.status.as_str())
    .bind(&voice.author_name)
    .bind(&voice.author_email)
    .bind(&voice.author_location)
    .bind(&voice.author_profession)
    .bind(&voice.impact)
    .bind(voice.reading_time)
    .bind(voice.published_at)
    .bind(voice.created_at)
    .bind(voice.updated_at)
    .execute(pool)
    .await
    .context("Failed to create voice")?;

    let mut created = voice.clone();
    created.id = result.last_insert_rowid();
    Ok(created)
}

async fn get_voice_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Voice>> {
    let row = sqlx::query(&format!("SELECT {} FROM voices WHERE id = ?", VOICE_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get voice by ID")?;

    row.as_ref().map(row_to_voice_sqlite).transpose()
}

async fn get_voice_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Voice>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM voices WHERE slug = ?",
        VOICE_COLUMNS
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await
    .context("Failed to get voice by slug")?;

    row.as_ref().map(row_to_voice_sqlite).transpose()
}

async fn list_voices_sqlite(
    pool: &SqlitePool,
    filter: &VoiceFilter,
    offset: i64,
    limit: i64,
) -> Result<Vec<Voice>> {
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
        .context("Failed to list voices")?;

    rows.iter().map(row_to_voice_sqlite).collect()
}

async fn count_voices_sqlite(pool: &SqlitePool, filter: &VoiceFilter) -> Result<i64> {
    let (sql, binds) = count_query(filter);
    let mut query = sqlx::query(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    let row = query
        .fetch_one(pool)
        .await
        .context("Failed to count voices")?;
    Ok(row.get("count"))
}

async fn update_voice_sqlite(pool: &SqlitePool, voice: &Voice) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE voices
        SET slug = ?, title = ?, content = ?, excerpt = ?, category = ?, status = ?, author_name = ?, author_location = ?, author_profession = ?, impact = ?, reading_time = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&voice.slug)
    .bind(&voice.title)
    .bind(&voice.content)
    .bind(&voice.excerpt)
    .bind(&voice.category)
    .bind(voice.status.as_str())
    .bind(&voice.author_name)
    .bind(&voice.author_location)
    .bind(&voice.author_profession)
    .bind(&voice.impact)
    .bind(voice.reading_time)
    .bind(voice.published_at)
    .bind(Utc::now())
    .bind(voice.id)
    .execute(pool)
    .await
    .context("Failed to update voice")?;

    Ok(())
}

async fn delete_voice_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM voices WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete voice")?;
    Ok(())
}

async fn exists_by_slug_sqlite(
    pool: &SqlitePool,
    slug: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let row = match exclude_id {
        Some(id) => {
            sqlx::query("SELECT COUNT(*) as count FROM voices WHERE slug = ? AND id != ?")
                .bind(slug)
                .bind(id)
                .fetch_one(pool)
                .await
        }
        None => {
            sqlx::query("SELECT COUNT(*) as count FROM voices WHERE slug = ?")
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

async fn create_voice_mysql(pool: &MySqlPool, voice: &Voice) -> Result<Voice> {
    let result = sqlx::query(
        r#"
        INSERT INTO voices (slug, title, content, excerpt, category, status, author_name, author_email, author_location, author_profession, impact, reading_time, published_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&voice.slug)
    .bind(&voice.title)
    .bind(&voice.content)
    .bind(&voice.excerpt)
    .bind(&voice.category)
    .bind(voice.status.as_str())
    .bind(&voice.author_name)
    .bind(&voice.author_email)
    .bind(&voice.author_location)
    .bind(&voice.author_profession)
    .bind(&voice.impact)
    .bind(voice.reading_time)
    .bind(voice.published_at)
    .bind(voice.created_at)
    .bind(voice.updated_at)
    .execute(pool)
    .await
    .context("Failed to create voice")?;

    let mut created = voice.clone();
    created.id = result.last_insert_id() as i64;
    Ok(created)
}

async fn get_voice_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Voice>> {
    let row = sqlx::query(&format!("SELECT {} FROM voices WHERE id = ?", VOICE_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get voice by ID")?;

    row.as_ref().map(row_to_voice_mysql).transpose()
}

async fn get_voice_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Voice>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM voices WHERE slug = ?",
        VOICE_COLUMNS
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await
    .context("Failed to get voice by slug")?;

    row.as_ref().map(row_to_voice_mysql).transpose()
}

async fn list_voices_mysql(
    pool: &MySqlPool,
    filter: &VoiceFilter,
    offset: i64,
    limit: i64,
) -> Result<Vec<Voice>> {
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
        .context("Failed to list voices")?;

    rows.iter().map(row_to_voice_mysql).collect()
}

async fn count_voices_mysql(pool: &MySqlPool, filter: &VoiceFilter) -> Result<i64> {
    let (sql, binds) = count_query(filter);
    let mut query = sqlx::query(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    let row = query
        .fetch_one(pool)
        .await
        .context("Failed to count voices")?;
    Ok(row.get("count"))
}

async fn update_voice_mysql(pool: &MySqlPool, voice: &Voice) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE voices
        SET slug = ?, title = ?, content = ?, excerpt = ?, category = ?, status = ?, author_name = ?, author_location = ?, author_profession = ?, impact = ?, reading_time = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&voice.slug)
    .bind(&voice.title)
    .bind(&voice.content)
    .bind(&voice.excerpt)
    .bind(&voice.category)
    .bind(voice.status.as_str())
    .bind(&voice.author_name)
    .bind(&voice.author_location)
    .bind(&voice.author_profession)
    .bind(&voice.impact)
    .bind(voice.reading_time)
    .bind(voice.published_at)
    .bind(Utc::now())
    .bind(voice.id)
    .execute(pool)
    .await
    .context("Failed to update voice")?;

    Ok(())
}

async fn delete_voice_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM voices WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete voice")?;
    Ok(())
}

async fn exists_by_slug_mysql(
    pool: &MySqlPool,
    slug: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let row = match exclude_id {
        Some(id) => {
            sqlx::query("SELECT COUNT(*) as count FROM voices WHERE slug = ? AND id != ?")
                .bind(slug)
                .bind(id)
                .fetch_one(pool)
                .await
        }
        None => {
            sqlx::query("SELECT COUNT(*) as count FROM voices WHERE slug = ?")
                .bind(slug)
                .fetch_one(pool)
                .await
        }
    }
    .context("Failed to check slug existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxVoiceRepository {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        SqlxVoiceRepository::new(pool)
    }

    fn sample_voice(slug: &str) -> Voice {
        let now = Utc::now();
        Voice {
            id: 0,
            slug: slug.to_string(),
            title: format!("Story {}", slug),
            content: "<p>My climate story</p>".to_string(),
            excerpt: "My climate story".to_string(),
            category: "personal".to_string(),
            status: VoiceStatus::Pending,
            author_name: "Ayşe Yılmaz".to_string(),
            author_email: "ayse@example.org".to_string(),
            author_location: Some("İstanbul".to_string()),
            author_profession: None,
            impact: None,
            reading_time: 1,
            published_at: None,
            created_at: now,
            updated_at: now,
            view_count: 0,
            like_count: 0,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_voice() {
        let repo = setup().await;
        let created = repo.create(&sample_voice("first-story")).await.unwrap();
        assert!(created.id > 0);

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, VoiceStatus::Pending);
        assert_eq!(fetched.author_name, "Ayşe Yılmaz");
        assert_eq!(fetched.author_location.as_deref(), Some("İstanbul"));
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let repo = setup().await;
        repo.create(&sample_voice("pending-one")).await.unwrap();

        let mut published = sample_voice("published-one");
        published.status = VoiceStatus::Published;
        published.published_at = Some(Utc::now());
        repo.create(&published).await.unwrap();

        let filter = VoiceFilter {
            status: Some(VoiceStatus::Published),
            ..Default::default()
        };
        let voices = repo.list(&filter, 0, 10).await.unwrap();
        assert_eq!(voices.len(), 1);
        assert_eq!(voices[0].slug, "published-one");
    }

    #[tokio::test]
    async fn test_search_matches_author_name() {
        let repo = setup().await;
        repo.create(&sample_voice("story-a")).await.unwrap();

        let mut other = sample_voice("story-b");
        other.author_name = "Mehmet Demir".to_string();
        repo.create(&other).await.unwrap();

        let filter = VoiceFilter {
            search: Some("Mehmet".to_string()),
            ..Default::default()
        };
        let voices = repo.list(&filter, 0, 10).await.unwrap();
        assert_eq!(voices.len(), 1);
        assert_eq!(voices[0].slug, "story-b");
    }

    #[tokio::test]
    async fn test_update_moderation_status() {
        let repo = setup().await;
        let mut voice = repo.create(&sample_voice("to-approve")).await.unwrap();

        voice.status = VoiceStatus::Published;
        voice.published_at = Some(Utc::now());
        repo.update(&voice).await.unwrap();

        let fetched = repo.get_by_id(voice.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, VoiceStatus::Published);
        assert!(fetched.published_at.is_some());
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let repo = setup().await;
        repo.create(&sample_voice("p1")).await.unwrap();
        repo.create(&sample_voice("p2")).await.unwrap();

        assert_eq!(repo.count_by_status(VoiceStatus::Pending).await.unwrap(), 2);
        assert_eq!(
            repo.count_by_status(VoiceStatus::Published).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_exists_by_slug() {
        let repo = setup().await;
        let voice = repo.create(&sample_voice("taken")).await.unwrap();

        assert!(repo.exists_by_slug("taken").await.unwrap());
        assert!(!repo.exists_by_slug_excluding("taken", voice.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_voice() {
        let repo = setup().await;
        let voice = repo.create(&sample_voice("gone")).await.unwrap();
        repo.delete(voice.id).await.unwrap();
        assert!(repo.get_by_id(voice.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_counters() {
        let repo = setup().await;
        let voice = repo.create(&sample_voice("counted")).await.unwrap();

        repo.increment_view_count(voice.id).await.unwrap();
        assert_eq!(repo.increment_like_count(voice.id).await.unwrap(), 1);
        assert_eq!(repo.increment_like_count(voice.id).await.unwrap(), 2);

        let fetched = repo.get_by_id(voice.id).await.unwrap().unwrap();
        assert_eq!(fetched.view_count, 1);
        assert_eq!(fetched.like_count, 2);
    }
}
