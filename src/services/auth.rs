//! Authentication and user management service
//!
//! Handles admin login, session validation, and user administration.
//! Sessions are random tokens persisted server-side; the browser sends
//! them back as a bearer token.

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{
    AdminUser, CreateUserInput, ListParams, PagedResult, Session, UpdateUserInput, UserRole,
    UserStatus,
};
use crate::services::password::{hash_password, verify_password};
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

/// Minimum password length for admin accounts
const MIN_PASSWORD_LEN: usize = 8;

/// Authentication and user management errors
#[derive(Debug, Error)]
pub enum AuthServiceError {
    /// Wrong email or password; deliberately indistinguishable
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Account exists but is disabled
    #[error("Account is disabled")]
    AccountDisabled,

    /// Session token exists but has expired
    #[error("Session expired")]
    SessionExpired,

    /// Session token is unknown
    #[error("Session not found")]
    SessionNotFound,

    /// User not found
    #[error("User not found: {0}")]
    UserNotFound(i64),

    /// Email already registered
    #[error("Email already registered: {0}")]
    EmailTaken(String),

    /// Input validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Authentication service
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    session_days: i64,
}

impl AuthService {
    /// Create a new auth service
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        session_days: i64,
    ) -> Self {
        Self {
            users,
            sessions,
            session_days,
        }
    }

    /// Authenticate an admin and create a session.
    ///
    /// Unknown email and wrong password both map to `InvalidCredentials`.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(AdminUser, Session), AuthServiceError> {
        let user = self
            .users
            .get_by_email(email)
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthServiceError::InvalidCredentials);
        }

        if !user.is_active() {
            return Err(AuthServiceError::AccountDisabled);
        }

        let session = Session::new(user.id, self.session_days);
        self.sessions.create(&session).await?;
        self.users.touch_last_login(user.id, Utc::now()).await?;

        tracing::info!(user_id = user.id, "Admin logged in");
        Ok((user, session))
    }

    /// Destroy a session. Unknown tokens are a no-op.
    pub async fn logout(&self, token: &str) -> Result<(), AuthServiceError> {
        self.sessions.delete(token).await?;
        Ok(())
    }

    /// Resolve a session token to its user.
    ///
    /// Expired sessions are deleted on sight. A valid session pointing at
    /// a disabled account is rejected as well.
    pub async fn validate_session(&self, token: &str) -> Result<AdminUser, AuthServiceError> {
        let session = self
            .sessions
            .get(token)
            .await?
            .ok_or(AuthServiceError::SessionNotFound)?;

        if session.is_expired() {
            self.sessions.delete(token).await?;
            return Err(AuthServiceError::SessionExpired);
        }

        let user = self
            .users
            .get_by_id(session.user_id)
            .await?
            .ok_or(AuthServiceError::SessionNotFound)?;

        if !user.is_active() {
            return Err(AuthServiceError::AccountDisabled);
        }

        Ok(user)
    }

    /// Delete all expired sessions
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, AuthServiceError> {
        let removed = self.sessions.delete_expired().await?;
        if removed > 0 {
            tracing::debug!(removed, "Swept expired sessions");
        }
        Ok(removed)
    }

    /// Create an admin user.
    ///
    /// The very first account becomes a super admin regardless of the
    /// requested role, so a fresh deployment can bootstrap itself.
    pub async fn create_user(
        &self,
        input: CreateUserInput,
    ) -> Result<AdminUser, AuthServiceError> {
        validate_email(&input.email)?;
        validate_password(&input.password)?;
        if input.display_name.trim().is_empty() {
            return Err(AuthServiceError::Validation(
                "Display name must not be empty".to_string(),
            ));
        }

        if self.users.get_by_email(&input.email).await?.is_some() {
            return Err(AuthServiceError::EmailTaken(input.email));
        }

        let is_first_user = self.users.count().await? == 0;
        let role = if is_first_user {
            UserRole::SuperAdmin
        } else {
            input.role.unwrap_or_default()
        };

        let password_hash = hash_password(&input.password)?;
        let mut user = AdminUser::new(input.email, input.display_name, password_hash, role);
        if let Some(permissions) = input.permissions {
            if !is_first_user {
                user.permissions = permissions;
            }
        }

        let created = self.users.create(&user).await?;
        tracing::info!(user_id = created.id, role = %created.role, "Admin user created");
        Ok(created)
    }

    /// Get a user by ID
    pub async fn get_user(&self, id: i64) -> Result<AdminUser, AuthServiceError> {
        self.users
            .get_by_id(id)
            .await?
            .ok_or(AuthServiceError::UserNotFound(id))
    }

    /// List users with pagination
    pub async fn list_users(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<AdminUser>, AuthServiceError> {
        let total = self.users.count().await?;
        let items = self.users.list(params.offset(), params.limit()).await?;
        Ok(PagedResult::new(items, total, params))
    }

    /// Total number of admin users
    pub async fn count_users(&self) -> Result<i64, AuthServiceError> {
        Ok(self.users.count().await?)
    }

    /// Update a user.
    ///
    /// A role change without an explicit permission list reseeds the
    /// permissions from the new role's defaults. Changing the permissions
    /// explicitly replaces the whole list.
    pub async fn update_user(
        &self,
        id: i64,
        input: UpdateUserInput,
    ) -> Result<AdminUser, AuthServiceError> {
        let mut user = self.get_user(id).await?;

        if let Some(email) = input.email {
            validate_email(&email)?;
            if email != user.email && self.users.get_by_email(&email).await?.is_some() {
                return Err(AuthServiceError::EmailTaken(email));
            }
            user.email = email;
        }
        if let Some(display_name) = input.display_name {
            if display_name.trim().is_empty() {
                return Err(AuthServiceError::Validation(
                    "Display name must not be empty".to_string(),
                ));
            }
            user.display_name = display_name;
        }
        if let Some(password) = input.password {
            validate_password(&password)?;
            user.password_hash = hash_password(&password)?;
        }
        if let Some(role) = input.role {
            if role != user.role && input.permissions.is_none() {
                user.permissions = role.default_permissions();
            }
            user.role = role;
        }
        if let Some(status) = input.status {
            user.status = status;
            if status == UserStatus::Disabled {
                // Disabled accounts lose their live sessions immediately
                self.sessions.delete_for_user(user.id).await?;
            }
        }
        if let Some(permissions) = input.permissions {
            user.permissions = permissions;
        }

        self.users.update(&user).await?;
        self.get_user(id).await
    }

    /// Delete a user and all of their sessions
    pub async fn delete_user(&self, id: i64) -> Result<(), AuthServiceError> {
        let user = self.get_user(id).await?;
        self.users.delete(user.id).await?;
        tracing::info!(user_id = id, "Admin user deleted");
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), AuthServiceError> {
    let trimmed = email.trim();
    if trimmed.is_empty() || !trimmed.contains('@') || trimmed.starts_with('@') {
        return Err(AuthServiceError::Validation(format!(
            "Invalid email address: {}",
            email
        )));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AuthServiceError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthServiceError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
