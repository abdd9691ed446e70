//! Admin user repository
//!
//! Database operations for admin users. Permissions are stored as a JSON
//! array of strings in the `permissions` column.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{AdminUser, UserRole, UserStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Admin user repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user; returns the stored record with its id
    async fn create(&self, user: &AdminUser) -> Result<AdminUser>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<AdminUser>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<AdminUser>>;

    /// List users with pagination, newest first
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<AdminUser>>;

    /// Count all users
    async fn count(&self) -> Result<i64>;

    /// Persist the mutable fields of an existing user
    async fn update(&self, user: &AdminUser) -> Result<()>;

    /// Record a successful login
    async fn touch_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<()>;

    /// Delete a user
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based admin user repository supporting SQLite and MySQL
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &AdminUser) -> Result<AdminUser> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_user_sqlite(self.pool.as_sqlite().unwrap(), user).await,
            DatabaseDriver::Mysql => create_user_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<AdminUser>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_user_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<AdminUser>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_email_sqlite(self.pool.as_sqlite().unwrap(), email).await
            }
            DatabaseDriver::Mysql => {
                get_user_by_email_mysql(self.pool.as_mysql().unwrap(), email).await
            }
        }
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<AdminUser>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_users_sqlite(self.pool.as_sqlite().unwrap(), offset, limit).await
            }
            DatabaseDriver::Mysql => {
                list_users_mysql(self.pool.as_mysql().unwrap(), offset, limit).await
            }
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_users_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => count_users_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn update(&self, user: &AdminUser) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_user_sqlite(self.pool.as_sqlite().unwrap(), user).await,
            DatabaseDriver::Mysql => update_user_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn touch_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                touch_last_login_sqlite(self.pool.as_sqlite().unwrap(), id, at).await
            }
            DatabaseDriver::Mysql => {
                touch_last_login_mysql(self.pool.as_mysql().unwrap(), id, at).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_user_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_user_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

const USER_COLUMNS: &str = "id, email, display_name, password_hash, role, status, permissions, last_login, created_at, updated_at";

fn permissions_to_json(permissions: &[String]) -> String {
    serde_json::to_string(permissions).unwrap_or_else(|_| "[]".to_string())
}

fn permissions_from_json(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<AdminUser> {
    let role_str: String = row.get("role");
    let status_str: String = row.get("status");
    let permissions_raw: String = row.get("permissions");

    Ok(AdminUser {
        id: row.get("id"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        password_hash: row.get("password_hash"),
        role: UserRole::from_str(&role_str)?,
        status: UserStatus::from_str(&status_str)?,
        permissions: permissions_from_json(&permissions_raw),
        last_login: row.get("last_login"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<AdminUser> {
    let role_str: String = row.get("role");
    let status_str: String = row.get("status");
    let permissions_raw: String = row.get("permissions");

    Ok(AdminUser {
        id: row.get("id"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        password_hash: row.get("password_hash"),
        role: UserRole::from_str(&role_str)?,
        status: UserStatus::from_str(&status_str)?,
        permissions: permissions_from_json(&permissions_raw),
        last_login: row.get("last_login"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &AdminUser) -> Result<AdminUser> {
    let result = sqlx::query(
        r#"
        INSERT INTO admin_users (email, display_name, password_hash, role, status, permissions, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.email)
    .bind(&user.display_name)
    .bind(&user.password_hash)
    .bind(user.role.as_str())
    .bind(user.status.to_string())
    .bind(permissions_to_json(&user.permissions))
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await
    .context("Failed to create admin user")?;

    let mut created = user.clone();
    created.id = result.last_insert_rowid();
    Ok(created)
}

async fn get_user_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<AdminUser>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM admin_users WHERE id = ?",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by ID")?;

    row.as_ref().map(row_to_user_sqlite).transpose()
}

async fn get_user_by_email_sqlite(pool: &SqlitePool, email: &str) -> Result<Option<AdminUser>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM admin_users WHERE email = ?",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by email")?;

    row.as_ref().map(row_to_user_sqlite).transpose()
}

async fn list_users_sqlite(pool: &SqlitePool, offset: i64, limit: i64) -> Result<Vec<AdminUser>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM admin_users ORDER BY created_at DESC LIMIT ? OFFSET ?",
        USER_COLUMNS
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to list users")?;

    rows.iter().map(row_to_user_sqlite).collect()
}

async fn count_users_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM admin_users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;
    Ok(row.get("count"))
}

async fn update_user_sqlite(pool: &SqlitePool, user: &AdminUser) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE admin_users
        SET email = ?, display_name = ?, password_hash = ?, role = ?, status = ?, permissions = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.email)
    .bind(&user.display_name)
    .bind(&user.password_hash)
    .bind(user.role.as_str())
    .bind(user.status.to_string())
    .bind(permissions_to_json(&user.permissions))
    .bind(Utc::now())
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    Ok(())
}

async fn touch_last_login_sqlite(pool: &SqlitePool, id: i64, at: DateTime<Utc>) -> Result<()> {
    sqlx::query("UPDATE admin_users SET last_login = ? WHERE id = ?")
        .bind(at)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to record last login")?;
    Ok(())
}

async fn delete_user_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM admin_users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete user")?;
    Ok(())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &AdminUser) -> Result<AdminUser> {
    let result = sqlx::query(
        r#"
        INSERT INTO admin_users (email, display_name, password_hash, role, status, permissions, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.email)
    .bind(&user.display_name)
    .bind(&user.password_hash)
    .bind(user.role.as_str())
    .bind(user.status.to_string())
    .bind(permissions_to_json(&user.permissions))
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await
    .context("Failed to create admin user")?;

    let mut created = user.clone();
    created.id = result.last_insert_id() as i64;
    Ok(created)
}

async fn get_user_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<AdminUser>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM admin_users WHERE id = ?",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by ID")?;

    row.as_ref().map(row_to_user_mysql).transpose()
}

async fn get_user_by_email_mysql(pool: &MySqlPool, email: &str) -> Result<Option<AdminUser>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM admin_users WHERE email = ?",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by email")?;

    row.as_ref().map(row_to_user_mysql).transpose()
}

async fn list_users_mysql(pool: &MySqlPool, offset: i64, limit: i64) -> Result<Vec<AdminUser>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM admin_users ORDER BY created_at DESC LIMIT ? OFFSET ?",
        USER_COLUMNS
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to list users")?;

    rows.iter().map(row_to_user_mysql).collect()
}

async fn count_users_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM admin_users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;
    Ok(row.get("count"))
}

async fn update_user_mysql(pool: &MySqlPool, user: &AdminUser) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE admin_users
        SET email = ?, display_name = ?, password_hash = ?, role = ?, status = ?, permissions = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.email)
    .bind(&user.display_name)
    .bind(&user.password_hash)
    .bind(user.role.as_str())
    .bind(user.status.to_string())
    .bind(permissions_to_json(&user.permissions))
    .bind(Utc::now())
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    Ok(())
}

async fn touch_last_login_mysql(pool: &MySqlPool, id: i64, at: DateTime<Utc>) -> Result<()> {
    sqlx::query("UPDATE admin_users SET last_login = ? WHERE id = ?")
        .bind(at)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to record last login")?;
    Ok(())
}

async fn delete_user_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM admin_users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete user")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::UserRole;

    async fn setup() -> SqlxUserRepository {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        SqlxUserRepository::new(pool)
    }

    fn sample_user(email: &str) -> AdminUser {
        AdminUser::new(
            email.to_string(),
            "Sample".to_string(),
            "hash".to_string(),
            UserRole::Editor,
        )
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = setup().await;
        let created = repo.create(&sample_user("a@beyond2c.org")).await.unwrap();
        assert!(created.id > 0);

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.email, "a@beyond2c.org");
        assert_eq!(fetched.role, UserRole::Editor);
        assert_eq!(fetched.permissions, UserRole::Editor.default_permissions());
    }

    #[tokio::test]
    async fn test_get_by_email() {
        let repo = setup().await;
        repo.create(&sample_user("b@beyond2c.org")).await.unwrap();

        assert!(repo
            .get_by_email("b@beyond2c.org")
            .await
            .unwrap()
            .is_some());
        assert!(repo.get_by_email("missing@x.org").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = setup().await;
        repo.create(&sample_user("dup@beyond2c.org")).await.unwrap();
        assert!(repo.create(&sample_user("dup@beyond2c.org")).await.is_err());
    }

    #[tokio::test]
    async fn test_update_permissions_persist() {
        let repo = setup().await;
        let mut user = repo.create(&sample_user("c@beyond2c.org")).await.unwrap();

        user.permissions = vec!["voices.view".to_string()];
        repo.update(&user).await.unwrap();

        let fetched = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(fetched.permissions, vec!["voices.view".to_string()]);
    }

    #[tokio::test]
    async fn test_list_and_count() {
        let repo = setup().await;
        repo.create(&sample_user("one@beyond2c.org")).await.unwrap();
        repo.create(&sample_user("two@beyond2c.org")).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);
        let users = repo.list(0, 10).await.unwrap();
        assert_eq!(users.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_user() {
        let repo = setup().await;
        let user = repo.create(&sample_user("d@beyond2c.org")).await.unwrap();
        repo.delete(user.id).await.unwrap();
        assert!(repo.get_by_id(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_touch_last_login() {
        let repo = setup().await;
        let user = repo.create(&sample_user("e@beyond2c.org")).await.unwrap();
        assert!(user.last_login.is_none());

        repo.touch_last_login(user.id, Utc::now()).await.unwrap();
        let fetched = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert!(fetched.last_login.is_some());
    }
}
