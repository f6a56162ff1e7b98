//! Session entity and repository trait.
//!
//! Maps to the `user_sessions` table used for refresh token management.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// A refresh token session.
///
/// Maps to the `user_sessions` table:
/// - id: UUID PRIMARY KEY
/// - user_id: BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE
/// - refresh_token_hash: VARCHAR(64) NOT NULL UNIQUE -- SHA-256 of the opaque token
/// - expires_at: TIMESTAMPTZ NOT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - revoked_at: TIMESTAMPTZ NULL
///
/// The raw refresh token never touches the database; only its hash is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session ID
    pub id: Uuid,

    /// Owning user
    pub user_id: i64,

    /// SHA-256 hex digest of the refresh token
    #[serde(skip_serializing)]
    pub refresh_token_hash: String,

    /// Expiry timestamp
    pub expires_at: DateTime<Utc>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Set when the session is revoked (logout or rotation)
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a fresh, unrevoked session.
    pub fn new(user_id: i64, refresh_token_hash: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            refresh_token_hash,
            expires_at,
            created_at: Utc::now(),
            revoked_at: None,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Check if the session can still be used for refresh.
    pub fn is_valid(&self) -> bool {
        !self.is_expired() && !self.is_revoked()
    }
}

/// Data access contract for refresh sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a new session.
    async fn create(&self, session: &Session) -> Result<Session, AppError>;

    /// Look up a live session by the hash of its refresh token.
    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Session>, AppError>;

    /// Revoke a single session.
    async fn revoke(&self, id: Uuid) -> Result<(), AppError>;

    /// Revoke every session of a user.
    async fn revoke_all_for_user(&self, user_id: i64) -> Result<u64, AppError>;

    /// Remove expired sessions, returning how many were deleted.
    async fn delete_expired(&self) -> Result<u64, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_test_session() -> Session {
        Session {
            id: Uuid::new_v4(),
            user_id: 42,
            refresh_token_hash: "abc123".into(),
            expires_at: Utc::now() + Duration::days(7),
            created_at: Utc::now(),
            revoked_at: None,
        }
    }

    #[test]
    fn test_fresh_session_is_valid() {
        assert!(create_test_session().is_valid());
    }

    #[test]
    fn test_expired_session_is_invalid() {
        let mut session = create_test_session();
        session.expires_at = Utc::now() - Duration::minutes(1);

        assert!(session.is_expired());
        assert!(!session.is_valid());
    }

    #[test]
    fn test_revoked_session_is_invalid() {
        let mut session = create_test_session();
        session.revoked_at = Some(Utc::now());

        assert!(session.is_revoked());
        assert!(!session.is_valid());
    }

    #[test]
    fn test_token_hash_not_serialized() {
        let session = create_test_session();
        let serialized = serde_json::to_string(&session).unwrap();

        assert!(!serialized.contains("refresh_token_hash"));
        assert!(!serialized.contains("abc123"));
    }
}
