//! Chat messages: text, optional image attachment, shared read flag.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A message sent in a chat.
///
/// Maps to the `messages` table:
/// - id: BIGINT PRIMARY KEY, snowflake
/// - chat_id: BIGINT NOT NULL REFERENCES chats(id) ON DELETE CASCADE
/// - sender_id: BIGINT NOT NULL REFERENCES users(id)
/// - text: TEXT NOT NULL DEFAULT '' -- may be empty when an image is attached
/// - image_path: VARCHAR(512) NULL -- media-root relative path
/// - is_read: BOOLEAN NOT NULL DEFAULT FALSE
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
///
/// Messages are immutable after creation except for the read flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Snowflake id, also the primary key
    pub id: i64,

    /// Chat this message belongs to
    pub chat_id: i64,

    /// Author of the message
    pub sender_id: i64,

    /// Message body; empty string when only an image was sent
    pub text: String,

    /// Attached image, relative to the media root
    pub image_path: Option<String>,

    /// Single shared read flag (not tracked per participant)
    pub is_read: bool,

    /// Creation timestamp (chronological ordering key)
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Whether the message carries any content at all.
    pub fn has_content(&self) -> bool {
        !self.text.is_empty() || self.image_path.is_some()
    }
}

impl Default for Message {
    fn default() -> Self {
        Self {
            id: 0,
            chat_id: 0,
            sender_id: 0,
            text: String::new(),
            image_path: None,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

/// Data access contract for messages.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, AppError>;

    /// Insert a message with its service-generated id.
    async fn create(&self, message: &Message) -> Result<Message, AppError>;

    /// All messages of a chat in chronological order.
    async fn list_for_chat(&self, chat_id: i64) -> Result<Vec<Message>, AppError>;

    /// Newest message of a chat, if any.
    async fn last_for_chat(&self, chat_id: i64) -> Result<Option<Message>, AppError>;

    /// Unread messages in the chat not authored by `viewer_id`.
    async fn unread_count(&self, chat_id: i64, viewer_id: i64) -> Result<i64, AppError>;

    /// Set the read flag. Unconditional; marking an already read
    /// message is a no-op.
    async fn mark_read(&self, message_id: i64) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_message_is_unread() {
        assert!(!Message::default().is_read);
    }

    #[test]
    fn test_has_content_with_text() {
        let message = Message {
            text: "hello".into(),
            ..Message::default()
        };
        assert!(message.has_content());
    }

    #[test]
    fn test_has_content_with_image_only() {
        let message = Message {
            image_path: Some("chat_images/a.png".into()),
            ..Message::default()
        };
        assert!(message.has_content());
    }

    #[test]
    fn test_empty_message_has_no_content() {
        // Allowed by the API, surfaced here for clients that care
        assert!(!Message::default().has_content());
    }
}
