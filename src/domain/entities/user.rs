//! User entity and repository trait.
//!
//! Accounts, their profile fields and the derived display helpers the
//! response DTOs use.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Represents a user account in the marketplace.
///
/// Maps to the `users` table:
/// - id: BIGINT PRIMARY KEY, snowflake
/// - username: VARCHAR(150) NOT NULL UNIQUE
/// - email: VARCHAR(255) NULL UNIQUE
/// - password_hash: VARCHAR(255) NOT NULL
/// - first_name: VARCHAR(150) NULL
/// - last_name: VARCHAR(150) NULL
/// - photo_path: TEXT NULL -- media-root relative path
/// - avatar_seed: VARCHAR(150) NOT NULL
/// - is_active: BOOLEAN NOT NULL DEFAULT TRUE
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - updated_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
///
/// Skills the user can teach or wants to learn live in the `user_skills`
/// join table and are loaded separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Snowflake id, also the primary key
    pub id: i64,

    /// Login name (3-150 characters, unique)
    pub username: String,

    /// Optional email, unique when present
    pub email: Option<String>,

    /// Argon2id hash, never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Given name
    pub first_name: Option<String>,

    /// Family name
    pub last_name: Option<String>,

    /// Uploaded profile photo, relative to the media root
    pub photo_path: Option<String>,

    /// Seed for client-side generated avatars, defaults to the username
    pub avatar_seed: String,

    /// Inactive accounts cannot sign in
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Full display name: "first last" when either part is set,
    /// otherwise the username.
    pub fn full_name(&self) -> String {
        let joined = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            self.username.clone()
        } else {
            trimmed.to_string()
        }
    }

    /// Single uppercase character shown in avatar placeholders.
    ///
    /// First character of the first name, else the last name, else the
    /// username; "U" when everything is empty.
    pub fn avatar_text(&self) -> String {
        self.first_name
            .as_deref()
            .and_then(|s| s.chars().next())
            .or_else(|| self.last_name.as_deref().and_then(|s| s.chars().next()))
            .or_else(|| self.username.chars().next())
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_else(|| "U".to_string())
    }
}

impl Default for User {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            username: String::new(),
            email: None,
            password_hash: String::new(),
            first_name: None,
            last_name: None,
            photo_path: None,
            avatar_seed: String::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Data access contract for users, implemented over PostgreSQL in the
/// infrastructure layer and in memory for service tests.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Load several users at once. Unknown IDs are simply absent from
    /// the result.
    async fn find_many(&self, ids: &[i64]) -> Result<Vec<User>, AppError>;

    /// Filter a candidate ID list down to the IDs that exist.
    async fn existing_ids(&self, ids: &[i64]) -> Result<Vec<i64>, AppError>;

    async fn create(&self, user: &User) -> Result<User, AppError>;

    /// Update profile fields of an existing user. Username stays fixed.
    async fn update(&self, user: &User) -> Result<User, AppError>;

    async fn username_exists(&self, username: &str) -> Result<bool, AppError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;
}
