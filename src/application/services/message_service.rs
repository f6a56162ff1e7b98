//! Message Service
//!
//! Sending messages into chats and flipping their read flag. Sending also
//! fans out push events: an invalidation signal on the chat channel and a
//! per-recipient chat summary on each other participant's user channel.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::application::dto::response::{ChatResponse, UrlContext};
use crate::domain::{
    ChatRepository, Message, MessageRepository, SkillRepository, UserRepository,
};
use crate::infrastructure::events::{chat_channel, user_channel, EventPublisher, StreamEvent};
use crate::shared::snowflake::SnowflakeGenerator;

use super::chat_service::assemble_chat_details;
use super::user_service::{load_profiles, UserProfile};

/// A message with its sender's profile, the shape every message-bearing
/// response uses.
#[derive(Debug, Clone)]
pub struct MessageDetails {
    pub message: Message,
    pub sender: UserProfile,
}

/// Message service trait
#[async_trait]
pub trait MessageService: Send + Sync {
    /// Send a message into a chat the sender participates in
    async fn send_message(
        &self,
        sender_id: i64,
        data: SendMessageData,
        urls: &UrlContext,
    ) -> Result<MessageDetails, MessageError>;

    /// Flip a message's read flag
    async fn mark_read(&self, message_id: i64, actor_id: i64) -> Result<(), MessageError>;
}

/// Send input. Either `text` or `image_path` may be empty; the API also
/// accepts messages with neither.
#[derive(Debug, Clone)]
pub struct SendMessageData {
    pub chat_id: i64,
    pub text: String,
    /// Media-root relative path of an already stored upload
    pub image_path: Option<String>,
}

/// Message service errors
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Chat not found or you are not a participant")]
    ChatAccess,

    #[error("Message not found")]
    NotFound,

    #[error("Access denied")]
    AccessDenied,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// MessageService implementation
pub struct MessageServiceImpl<M, C, U, K, P>
where
    M: MessageRepository,
    C: ChatRepository,
    U: UserRepository,
    K: SkillRepository,
    P: EventPublisher,
{
    message_repo: Arc<M>,
    chat_repo: Arc<C>,
    user_repo: Arc<U>,
    skill_repo: Arc<K>,
    publisher: Arc<P>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<M, C, U, K, P> MessageServiceImpl<M, C, U, K, P>
where
    M: MessageRepository,
    C: ChatRepository,
    U: UserRepository,
    K: SkillRepository,
    P: EventPublisher,
{
    pub fn new(
        message_repo: Arc<M>,
        chat_repo: Arc<C>,
        user_repo: Arc<U>,
        skill_repo: Arc<K>,
        publisher: Arc<P>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            message_repo,
            chat_repo,
            user_repo,
            skill_repo,
            publisher,
            id_generator,
        }
    }

    /// Push both event kinds for a freshly created message.
    ///
    /// Delivery is best effort. A dead event bus must not lose the message,
    /// so every failure is logged and swallowed.
    async fn publish_events(&self, message: &Message, urls: &UrlContext) {
        let event = StreamEvent::new_message();
        if let Err(e) = self
            .publisher
            .publish(&chat_channel(message.chat_id), &event)
            .await
        {
            tracing::warn!(
                chat_id = message.chat_id,
                error = %e,
                "Failed to publish message event"
            );
        }

        let chat = match self.chat_repo.find_by_id(message.chat_id).await {
            Ok(Some(chat)) => chat,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(
                    chat_id = message.chat_id,
                    error = %e,
                    "Failed to reload chat for summary events"
                );
                return;
            }
        };

        let participant_ids = match self.chat_repo.participant_ids(message.chat_id).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(
                    chat_id = message.chat_id,
                    error = %e,
                    "Failed to load participants for summary events"
                );
                return;
            }
        };

        // Each recipient gets the summary as THEY would see it, with their
        // own unread count and counterpart
        for recipient in participant_ids
            .into_iter()
            .filter(|id| *id != message.sender_id)
        {
            let details = match assemble_chat_details(
                self.chat_repo.as_ref(),
                self.message_repo.as_ref(),
                self.user_repo.as_ref(),
                self.skill_repo.as_ref(),
                &chat,
                recipient,
            )
            .await
            {
                Ok(details) => details,
                Err(e) => {
                    tracing::warn!(
                        chat_id = message.chat_id,
                        recipient,
                        error = %e,
                        "Failed to assemble chat summary"
                    );
                    continue;
                }
            };

            let summary = match serde_json::to_value(ChatResponse::from_details(&details, urls)) {
                Ok(summary) => summary,
                Err(e) => {
                    tracing::warn!(
                        chat_id = message.chat_id,
                        recipient,
                        error = %e,
                        "Failed to encode chat summary"
                    );
                    continue;
                }
            };

            if let Err(e) = self
                .publisher
                .publish(&user_channel(recipient), &StreamEvent::chat_update(summary))
                .await
            {
                tracing::warn!(
                    chat_id = message.chat_id,
                    recipient,
                    error = %e,
                    "Failed to publish chat update"
                );
            }
        }
    }
}

#[async_trait]
impl<M, C, U, K, P> MessageService for MessageServiceImpl<M, C, U, K, P>
where
    M: MessageRepository + 'static,
    C: ChatRepository + 'static,
    U: UserRepository + 'static,
    K: SkillRepository + 'static,
    P: EventPublisher + 'static,
{
    async fn send_message(
        &self,
        sender_id: i64,
        data: SendMessageData,
        urls: &UrlContext,
    ) -> Result<MessageDetails, MessageError> {
        // One combined check: a missing chat and a foreign chat look the same
        if !self
            .chat_repo
            .is_participant(data.chat_id, sender_id)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))?
        {
            return Err(MessageError::ChatAccess);
        }

        let message = Message {
            id: self.id_generator.generate(),
            chat_id: data.chat_id,
            sender_id,
            text: data.text,
            image_path: data.image_path,
            is_read: false,
            created_at: Utc::now(),
        };

        let message = self
            .message_repo
            .create(&message)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))?;

        // New activity bumps the chat to the top of everyone's list
        self.chat_repo
            .touch(message.chat_id, message.created_at)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))?;

        self.publish_events(&message, urls).await;

        let sender = load_profiles(
            self.user_repo.as_ref(),
            self.skill_repo.as_ref(),
            &[sender_id],
        )
        .await
        .map_err(|e| MessageError::Internal(e.to_string()))?
        .pop()
        .ok_or_else(|| MessageError::Internal(format!("Missing sender {}", sender_id)))?;

        Ok(MessageDetails { message, sender })
    }

    async fn mark_read(&self, message_id: i64, actor_id: i64) -> Result<(), MessageError> {
        let message = self
            .message_repo
            .find_by_id(message_id)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))?
            .ok_or(MessageError::NotFound)?;

        if !self
            .chat_repo
            .is_participant(message.chat_id, actor_id)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))?
        {
            return Err(MessageError::AccessDenied);
        }

        self.message_repo
            .mark_read(message_id)
            .await
            .map_err(|e| MessageError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::domain::{Chat, User};
    use crate::infrastructure::repositories::test_repos::{
        MemoryChatRepository, MemoryEventPublisher, MemoryMessageRepository,
        MemorySkillRepository, MemoryUserRepository,
    };

    struct Fixture {
        service: MessageServiceImpl<
            MemoryMessageRepository,
            MemoryChatRepository,
            MemoryUserRepository,
            MemorySkillRepository,
            MemoryEventPublisher,
        >,
        chats: Arc<MemoryChatRepository>,
        messages: Arc<MemoryMessageRepository>,
        users: Arc<MemoryUserRepository>,
        publisher: Arc<MemoryEventPublisher>,
    }

    fn fixture() -> Fixture {
        let messages = Arc::new(MemoryMessageRepository::default());
        let chats = Arc::new(MemoryChatRepository::default());
        let users = Arc::new(MemoryUserRepository::default());
        let skills = Arc::new(MemorySkillRepository::default());
        let publisher = Arc::new(MemoryEventPublisher::default());
        let service = MessageServiceImpl::new(
            messages.clone(),
            chats.clone(),
            users.clone(),
            skills,
            publisher.clone(),
            Arc::new(SnowflakeGenerator::new(1, 1)),
        );
        Fixture {
            service,
            chats,
            messages,
            users,
            publisher,
        }
    }

    fn urls() -> UrlContext {
        UrlContext::new(false, "localhost:8000")
    }

    async fn seed_user(f: &Fixture, id: i64, username: &str) {
        let user = User {
            id,
            username: username.to_string(),
            avatar_seed: username.to_string(),
            ..User::default()
        };
        f.users.create(&user).await.unwrap();
    }

    async fn seed_chat(f: &Fixture, id: i64, participants: &[i64]) -> Chat {
        let chat = Chat {
            id,
            ..Chat::default()
        };
        f.chats.create(&chat, participants).await.unwrap()
    }

    fn send_input(chat_id: i64, text: &str) -> SendMessageData {
        SendMessageData {
            chat_id,
            text: text.to_string(),
            image_path: None,
        }
    }

    #[tokio::test]
    async fn send_creates_unread_message_and_bumps_chat() {
        let f = fixture();
        seed_user(&f, 1, "marta").await;
        seed_user(&f, 2, "boris").await;
        let chat = seed_chat(&f, 100, &[1, 2]).await;

        let details = f
            .service
            .send_message(1, send_input(100, "hello"), &urls())
            .await
            .unwrap();

        assert_eq!(details.message.text, "hello");
        assert!(!details.message.is_read);
        assert_eq!(details.sender.user.username, "marta");

        let bumped = f.chats.find_by_id(100).await.unwrap().unwrap();
        assert!(bumped.updated_at > chat.updated_at);
        assert_eq!(bumped.updated_at, details.message.created_at);
    }

    #[tokio::test]
    async fn send_requires_participation() {
        let f = fixture();
        seed_user(&f, 1, "marta").await;
        seed_user(&f, 3, "anna").await;
        seed_chat(&f, 100, &[1]).await;

        let err = f
            .service
            .send_message(3, send_input(100, "intruding"), &urls())
            .await
            .unwrap_err();

        assert!(matches!(err, MessageError::ChatAccess));
    }

    #[tokio::test]
    async fn send_to_unknown_chat_reads_as_access_error() {
        let f = fixture();
        seed_user(&f, 1, "marta").await;

        let err = f
            .service
            .send_message(1, send_input(404, "hello?"), &urls())
            .await
            .unwrap_err();

        assert!(matches!(err, MessageError::ChatAccess));
    }

    #[tokio::test]
    async fn send_publishes_to_chat_and_other_participants() {
        let f = fixture();
        seed_user(&f, 1, "marta").await;
        seed_user(&f, 2, "boris").await;
        seed_chat(&f, 100, &[1, 2]).await;

        f.service
            .send_message(1, send_input(100, "hello"), &urls())
            .await
            .unwrap();

        let published = f.publisher.published();
        assert_eq!(published.len(), 2);

        // Invalidation signal on the chat channel comes first
        assert_eq!(published[0].0, "chat-100");
        assert_eq!(published[0].1.event, "message");
        assert_eq!(
            published[0].1.data,
            serde_json::json!({ "type": "new_message" })
        );

        // The summary goes only to the other participant
        assert_eq!(published[1].0, "chat-2");
        assert_eq!(published[1].1.event, "chat");
        assert_eq!(published[1].1.data["type"], "chat_update");
    }

    #[tokio::test]
    async fn chat_update_carries_the_recipients_view() {
        let f = fixture();
        seed_user(&f, 1, "marta").await;
        seed_user(&f, 2, "boris").await;
        seed_chat(&f, 100, &[1, 2]).await;

        f.service
            .send_message(1, send_input(100, "hello"), &urls())
            .await
            .unwrap();

        let published = f.publisher.published();
        let summary = &published[1].1.data["data"];

        // Boris has one unread message from marta, and marta is his counterpart
        assert_eq!(summary["unread_count"], 1);
        assert_eq!(summary["other_participant"]["username"], "marta");
        assert_eq!(summary["last_message"]["text"], "hello");
    }

    #[tokio::test]
    async fn send_survives_a_dead_event_bus() {
        let f = fixture();
        seed_user(&f, 1, "marta").await;
        seed_user(&f, 2, "boris").await;
        seed_chat(&f, 100, &[1, 2]).await;
        f.publisher.set_failing(true);

        let details = f
            .service
            .send_message(1, send_input(100, "still delivered"), &urls())
            .await
            .unwrap();

        let stored = f.messages.find_by_id(details.message.id).await.unwrap();
        assert!(stored.is_some());
        assert!(f.publisher.published().is_empty());
    }

    #[tokio::test]
    async fn mark_read_flips_the_flag() {
        let f = fixture();
        seed_user(&f, 1, "marta").await;
        seed_user(&f, 2, "boris").await;
        seed_chat(&f, 100, &[1, 2]).await;
        let details = f
            .service
            .send_message(1, send_input(100, "hello"), &urls())
            .await
            .unwrap();
        assert_eq!(f.messages.unread_count(100, 2).await.unwrap(), 1);

        f.service.mark_read(details.message.id, 2).await.unwrap();

        assert_eq!(f.messages.unread_count(100, 2).await.unwrap(), 0);

        // Marking again is a no-op, not an error
        f.service.mark_read(details.message.id, 2).await.unwrap();
    }

    #[tokio::test]
    async fn mark_read_works_on_the_senders_own_message() {
        let f = fixture();
        seed_user(&f, 1, "marta").await;
        seed_user(&f, 2, "boris").await;
        seed_chat(&f, 100, &[1, 2]).await;
        let details = f
            .service
            .send_message(1, send_input(100, "mine"), &urls())
            .await
            .unwrap();

        f.service.mark_read(details.message.id, 1).await.unwrap();

        let stored = f
            .messages
            .find_by_id(details.message.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.is_read);
    }

    #[tokio::test]
    async fn mark_read_unknown_message() {
        let f = fixture();
        seed_user(&f, 1, "marta").await;

        let err = f.service.mark_read(404, 1).await.unwrap_err();

        assert!(matches!(err, MessageError::NotFound));
    }

    #[tokio::test]
    async fn mark_read_requires_participation() {
        let f = fixture();
        seed_user(&f, 1, "marta").await;
        seed_user(&f, 2, "boris").await;
        seed_user(&f, 3, "anna").await;
        seed_chat(&f, 100, &[1, 2]).await;
        let details = f
            .service
            .send_message(1, send_input(100, "private"), &urls())
            .await
            .unwrap();

        let err = f.service.mark_read(details.message.id, 3).await.unwrap_err();

        assert!(matches!(err, MessageError::AccessDenied));
    }
}
