//! Chat entity and repository trait.
//!
//! Maps to the `chats` and `chat_participants` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A conversation between participants.
///
/// Maps to the `chats` table:
/// - id: BIGINT PRIMARY KEY, snowflake
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - updated_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
///
/// Participants live in `chat_participants (chat_id, user_id)`. The chat
/// itself carries no other state; `updated_at` is touched on every new
/// message and drives the chat list ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,

    pub created_at: DateTime<Utc>,

    /// Bumped whenever a message arrives; list ordering key
    pub updated_at: DateTime<Utc>,
}

impl Default for Chat {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Data access contract for chats and their participant sets.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Chat>, AppError>;

    /// Create a chat together with its participant rows.
    async fn create(&self, chat: &Chat, participant_ids: &[i64]) -> Result<Chat, AppError>;

    /// Chats the user participates in, ordered by `updated_at` descending.
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Chat>, AppError>;

    /// Hard delete a chat; messages and participant rows cascade.
    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Whether the user is a participant of the chat.
    async fn is_participant(&self, chat_id: i64, user_id: i64) -> Result<bool, AppError>;

    /// Participant user IDs, ascending.
    async fn participant_ids(&self, chat_id: i64) -> Result<Vec<i64>, AppError>;

    /// Bump `updated_at` to `at`.
    async fn touch(&self, chat_id: i64, at: DateTime<Utc>) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timestamps_match() {
        let chat = Chat::default();
        assert_eq!(chat.created_at, chat.updated_at);
    }
}
