//! Admin user model
//!
//! Defines the `AdminUser` entity for the back-office, together with the
//! role enum and the flat permission-string model. A permission is an opaque
//! string; a user holds it or they don't. There is no wildcard or hierarchy
//! logic anywhere in the system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Admin user entity.
///
/// Permissions are granted as a flat list of opaque strings. Roles only
/// matter at creation time, when they seed the default permission set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    /// Unique identifier
    pub id: i64,
    /// Email address (unique, used for login)
    pub email: String,
    /// Display name shown in the admin UI
    pub display_name: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// User role
    pub role: UserRole,
    /// Account status
    pub status: UserStatus,
    /// Granted permission strings
    pub permissions: Vec<String>,
    /// Last successful login
    pub last_login: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl AdminUser {
    /// Create a new AdminUser with the given parameters.
    ///
    /// The password must already be hashed; use
    /// `services::password::hash_password()`. Permissions are seeded from
    /// the role's defaults.
    pub fn new(
        email: String,
        display_name: String,
        password_hash: String,
        role: UserRole,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            email,
            display_name,
            password_hash,
            role,
            status: UserStatus::Active,
            permissions: role.default_permissions(),
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether this user holds a permission.
    ///
    /// Exact string match against the granted list; nothing else.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    /// Check if the user is a super admin
    pub fn is_super_admin(&self) -> bool {
        self.role == UserRole::SuperAdmin
    }

    /// Check if the account can log in
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

/// Well-known permission strings.
///
/// These are the keys the admin frontend gates its navigation and actions
/// on. They are plain strings by design; the check is set membership.
pub mod permissions {
    pub const BLOGS_VIEW: &str = "blogs.view";
    pub const BLOGS_MANAGE: &str = "blogs.manage";
    pub const VOICES_VIEW: &str = "voices.view";
    pub const VOICES_MODERATE: &str = "voices.moderate";
    pub const USERS_MANAGE: &str = "users.manage";
    pub const ANALYTICS_VIEW: &str = "analytics.view";
    pub const UPLOADS_WRITE: &str = "uploads.write";

    /// Every permission the system knows about
    pub const ALL: &[&str] = &[
        BLOGS_VIEW,
        BLOGS_MANAGE,
        VOICES_VIEW,
        VOICES_MODERATE,
        USERS_MANAGE,
        ANALYTICS_VIEW,
        UPLOADS_WRITE,
    ];
}

/// Admin user role.
///
/// Roles determine the default permission set at user creation:
/// - SuperAdmin: all permissions
/// - Editor: content and uploads, read-only analytics
/// - Moderator: voice review only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access, including user management
    SuperAdmin,
    /// Can manage blog posts and voices
    Editor,
    /// Can review submitted voices
    Moderator,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Editor
    }
}

impl UserRole {
    /// The permission strings granted to a freshly created user of this role
    pub fn default_permissions(&self) -> Vec<String> {
        use permissions::*;
        let granted: &[&str] = match self {
            UserRole::SuperAdmin => ALL,
            UserRole::Editor => &[
                BLOGS_VIEW,
                BLOGS_MANAGE,
                VOICES_VIEW,
                VOICES_MODERATE,
                ANALYTICS_VIEW,
                UPLOADS_WRITE,
            ],
            UserRole::Moderator => &[VOICES_VIEW, VOICES_MODERATE],
        };
        granted.iter().map(|s| s.to_string()).collect()
    }

    /// Convert role to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::SuperAdmin => "super_admin",
            UserRole::Editor => "editor",
            UserRole::Moderator => "moderator",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "super_admin" => Ok(UserRole::SuperAdmin),
            "editor" => Ok(UserRole::Editor),
            "moderator" => Ok(UserRole::Moderator),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Normal access
    Active,
    /// Cannot log in
    Disabled,
}

impl Default for UserStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserStatus::Active => write!(f, "active"),
            UserStatus::Disabled => write!(f, "disabled"),
        }
    }
}

impl FromStr for UserStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(UserStatus::Active),
            "disabled" => Ok(UserStatus::Disabled),
            _ => Err(anyhow::anyhow!("Invalid user status: {}", s)),
        }
    }
}

/// Input for creating a new admin user (before password hashing)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserInput {
    /// Email address
    pub email: String,
    /// Display name
    pub display_name: String,
    /// Plaintext password (will be hashed)
    pub password: String,
    /// User role (optional, defaults to Editor)
    pub role: Option<UserRole>,
    /// Explicit permission list; role defaults are used when absent
    pub permissions: Option<Vec<String>>,
}

/// Input for updating an admin user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserInput {
    /// New email (optional)
    pub email: Option<String>,
    /// New display name (optional)
    pub display_name: Option<String>,
    /// New password (optional, will be hashed)
    pub password: Option<String>,
    /// New role (optional)
    pub role: Option<UserRole>,
    /// New status (optional)
    pub status: Option<UserStatus>,
    /// Replacement permission list (optional)
    pub permissions: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_role(role: UserRole) -> AdminUser {
        AdminUser::new(
            "test@beyond2c.org".to_string(),
            "Test User".to_string(),
            "hash".to_string(),
            role,
        )
    }

    #[test]
    fn test_permission_check_exact_match() {
        let mut user = user_with_role(UserRole::Moderator);
        user.permissions = vec!["voices.moderate".to_string()];

        assert!(user.has_permission("voices.moderate"));
        assert!(!user.has_permission("voices"));
        assert!(!user.has_permission("voices.moderate.all"));
        assert!(!user.has_permission("blogs.manage"));
    }

    #[test]
    fn test_super_admin_default_permissions() {
        let user = user_with_role(UserRole::SuperAdmin);
        for p in permissions::ALL {
            assert!(user.has_permission(p), "super admin missing {}", p);
        }
    }

    #[test]
    fn test_editor_defaults_exclude_user_management() {
        let user = user_with_role(UserRole::Editor);
        assert!(user.has_permission(permissions::BLOGS_MANAGE));
        assert!(!user.has_permission(permissions::USERS_MANAGE));
    }

    #[test]
    fn test_moderator_defaults() {
        let user = user_with_role(UserRole::Moderator);
        assert!(user.has_permission(permissions::VOICES_MODERATE));
        assert!(!user.has_permission(permissions::BLOGS_VIEW));
        assert!(!user.has_permission(permissions::UPLOADS_WRITE));
    }

    #[test]
    fn test_user_role_roundtrip() {
        for role in [UserRole::SuperAdmin, UserRole::Editor, UserRole::Moderator] {
            assert_eq!(UserRole::from_str(role.as_str()).unwrap(), role);
        }
        assert!(UserRole::from_str("admin").is_err());
    }

    #[test]
    fn test_user_status_parsing() {
        assert_eq!(UserStatus::from_str("ACTIVE").unwrap(), UserStatus::Active);
        assert_eq!(
            UserStatus::from_str("disabled").unwrap(),
            UserStatus::Disabled
        );
        assert!(UserStatus::from_str("banned").is_err());
    }

    #[test]
    fn test_disabled_user_not_active() {
        let mut user = user_with_role(UserRole::Editor);
        user.status = UserStatus::Disabled;
        assert!(!user.is_active());
    }
}
