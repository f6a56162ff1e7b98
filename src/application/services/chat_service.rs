//! Chat Service
//!
//! One-to-one conversations: creation, the viewer's chat list with its
//! derived summary fields, and chat deletion.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{
    Chat, ChatRepository, MessageRepository, SkillRepository, User, UserRepository,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

use super::message_service::MessageDetails;
use super::user_service::{load_profiles, UserProfile};

/// A chat with the derived fields its list entry shows. Everything except
/// `participants` depends on who is looking.
#[derive(Debug, Clone)]
pub struct ChatDetails {
    pub chat: Chat,
    pub participants: Vec<UserProfile>,
    /// Counterpart from the viewer's perspective; the participant with the
    /// lowest id that is not the viewer
    pub other_participant: Option<User>,
    pub last_message: Option<MessageDetails>,
    /// Unread messages from other senders
    pub unread_count: i64,
}

/// Compute the viewer-dependent summary of one chat.
///
/// Shared with the message side, which pushes the same summary to the
/// other participants when a message lands.
pub(crate) async fn assemble_chat_details(
    chat_repo: &dyn ChatRepository,
    message_repo: &dyn MessageRepository,
    user_repo: &dyn UserRepository,
    skill_repo: &dyn SkillRepository,
    chat: &Chat,
    viewer_id: i64,
) -> Result<ChatDetails, AppError> {
    let participant_ids = chat_repo.participant_ids(chat.id).await?;
    let participants = load_profiles(user_repo, skill_repo, &participant_ids).await?;

    // participant_ids come back ascending, so the first non-viewer hit
    // is the lowest id
    let other_participant = participants
        .iter()
        .map(|p| &p.user)
        .find(|u| u.id != viewer_id)
        .cloned();

    let last_message = match message_repo.last_for_chat(chat.id).await? {
        Some(message) => {
            let sender = load_profiles(user_repo, skill_repo, &[message.sender_id])
                .await?
                .pop()
                .ok_or_else(|| {
                    AppError::Internal(format!("Missing sender {}", message.sender_id))
                })?;
            Some(MessageDetails { message, sender })
        }
        None => None,
    };

    let unread_count = message_repo.unread_count(chat.id, viewer_id).await?;

    Ok(ChatDetails {
        chat: chat.clone(),
        participants,
        other_participant,
        last_message,
        unread_count,
    })
}

/// Chat service trait
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Open a chat between the creator and the given users
    async fn create_chat(
        &self,
        creator_id: i64,
        participant_ids: &[i64],
    ) -> Result<ChatDetails, ChatError>;

    /// The viewer's chats, most recently active first
    async fn list_chats(&self, viewer_id: i64) -> Result<Vec<ChatDetails>, ChatError>;

    /// Hard delete a chat the viewer participates in
    async fn delete_chat(&self, chat_id: i64, viewer_id: i64) -> Result<(), ChatError>;

    /// All messages of a chat in chronological order
    async fn chat_messages(
        &self,
        chat_id: i64,
        viewer_id: i64,
    ) -> Result<Vec<MessageDetails>, ChatError>;
}

/// Chat service errors
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Chat not found")]
    NotFound,

    #[error("Not a chat participant")]
    NotParticipant,

    #[error("A chat needs someone else in it")]
    SelfChat,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// ChatService implementation
pub struct ChatServiceImpl<C, M, U, K>
where
    C: ChatRepository,
    M: MessageRepository,
    U: UserRepository,
    K: SkillRepository,
{
    chat_repo: Arc<C>,
    message_repo: Arc<M>,
    user_repo: Arc<U>,
    skill_repo: Arc<K>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<C, M, U, K> ChatServiceImpl<C, M, U, K>
where
    C: ChatRepository,
    M: MessageRepository,
    U: UserRepository,
    K: SkillRepository,
{
    pub fn new(
        chat_repo: Arc<C>,
        message_repo: Arc<M>,
        user_repo: Arc<U>,
        skill_repo: Arc<K>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            chat_repo,
            message_repo,
            user_repo,
            skill_repo,
            id_generator,
        }
    }

    async fn details(&self, chat: &Chat, viewer_id: i64) -> Result<ChatDetails, ChatError> {
        assemble_chat_details(
            self.chat_repo.as_ref(),
            self.message_repo.as_ref(),
            self.user_repo.as_ref(),
            self.skill_repo.as_ref(),
            chat,
            viewer_id,
        )
        .await
        .map_err(|e| ChatError::Internal(e.to_string()))
    }
}

#[async_trait]
impl<C, M, U, K> ChatService for ChatServiceImpl<C, M, U, K>
where
    C: ChatRepository + 'static,
    M: MessageRepository + 'static,
    U: UserRepository + 'static,
    K: SkillRepository + 'static,
{
    async fn create_chat(
        &self,
        creator_id: i64,
        participant_ids: &[i64],
    ) -> Result<ChatDetails, ChatError> {
        if participant_ids.contains(&creator_id) {
            return Err(ChatError::SelfChat);
        }

        // Unknown ids are dropped rather than rejected
        let mut members = self
            .user_repo
            .existing_ids(participant_ids)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;
        members.push(creator_id);

        let now = Utc::now();
        let chat = Chat {
            id: self.id_generator.generate(),
            created_at: now,
            updated_at: now,
        };

        let chat = self
            .chat_repo
            .create(&chat, &members)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;

        self.details(&chat, creator_id).await
    }

    async fn list_chats(&self, viewer_id: i64) -> Result<Vec<ChatDetails>, ChatError> {
        let chats = self
            .chat_repo
            .list_for_user(viewer_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;

        let mut details = Vec::with_capacity(chats.len());
        for chat in &chats {
            details.push(self.details(chat, viewer_id).await?);
        }

        Ok(details)
    }

    async fn delete_chat(&self, chat_id: i64, viewer_id: i64) -> Result<(), ChatError> {
        self.chat_repo
            .find_by_id(chat_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?
            .ok_or(ChatError::NotFound)?;

        if !self
            .chat_repo
            .is_participant(chat_id, viewer_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?
        {
            return Err(ChatError::NotParticipant);
        }

        self.chat_repo
            .delete(chat_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))
    }

    async fn chat_messages(
        &self,
        chat_id: i64,
        viewer_id: i64,
    ) -> Result<Vec<MessageDetails>, ChatError> {
        self.chat_repo
            .find_by_id(chat_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?
            .ok_or(ChatError::NotFound)?;

        if !self
            .chat_repo
            .is_participant(chat_id, viewer_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?
        {
            return Err(ChatError::NotParticipant);
        }

        let messages = self
            .message_repo
            .list_for_chat(chat_id)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;

        let mut sender_ids: Vec<i64> = messages.iter().map(|m| m.sender_id).collect();
        sender_ids.sort_unstable();
        sender_ids.dedup();

        let senders = load_profiles(self.user_repo.as_ref(), self.skill_repo.as_ref(), &sender_ids)
            .await
            .map_err(|e| ChatError::Internal(e.to_string()))?;

        let mut details = Vec::with_capacity(messages.len());
        for message in messages {
            let sender = senders
                .iter()
                .find(|p| p.user.id == message.sender_id)
                .cloned()
                .ok_or_else(|| {
                    ChatError::Internal(format!("Missing sender {}", message.sender_id))
                })?;
            details.push(MessageDetails { message, sender });
        }

        Ok(details)
    }
}
