//! Chat Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Host;

use crate::application::dto::request::CreateChatRequest;
use crate::application::dto::response::{ChatMessagesResponse, ChatResponse, MessageResponse, UrlContext};
use crate::application::services::{ChatService, ChatServiceImpl};
use crate::infrastructure::repositories::{
    PgChatRepository, PgMessageRepository, PgSkillRepository, PgUserRepository,
};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::parse_snowflake;
use crate::startup::AppState;

fn chat_service(
    state: &AppState,
) -> ChatServiceImpl<PgChatRepository, PgMessageRepository, PgUserRepository, PgSkillRepository> {
    let chat_repo = Arc::new(PgChatRepository::new(state.db.clone()));
    let message_repo = Arc::new(PgMessageRepository::new(state.db.clone()));
    let user_repo = Arc::new(PgUserRepository::new(state.db.clone()));
    let skill_repo = Arc::new(PgSkillRepository::new(state.db.clone()));
    ChatServiceImpl::new(
        chat_repo,
        message_repo,
        user_repo,
        skill_repo,
        state.snowflake.clone(),
    )
}

/// List the authenticated user's chats, most recently active first
pub async fn list_chats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Host(host): Host,
) -> Result<Json<Vec<ChatResponse>>, AppError> {
    let chats = chat_service(&state)
        .list_chats(auth.user_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let urls = UrlContext::new(state.settings.is_production(), host);
    let responses: Vec<ChatResponse> = chats
        .iter()
        .map(|details| ChatResponse::from_details(details, &urls))
        .collect();

    Ok(Json(responses))
}

/// Create a chat with the given participants
pub async fn create_chat(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Host(host): Host,
    Json(body): Json<CreateChatRequest>,
) -> Result<(StatusCode, Json<ChatResponse>), AppError> {
    let mut other_ids = Vec::with_capacity(body.participants.len());
    for value in &body.participants {
        other_ids.push(parse_snowflake("participants", value)?);
    }

    let details = chat_service(&state)
        .create_chat(auth.user_id, &other_ids)
        .await
        .map_err(|e| match e {
            crate::application::services::ChatError::SelfChat => {
                AppError::Validation("You cannot create a chat with yourself".into())
            }
            e => AppError::Internal(e.to_string()),
        })?;

    let urls = UrlContext::new(state.settings.is_production(), host);
    Ok((
        StatusCode::CREATED,
        Json(ChatResponse::from_details(&details, &urls)),
    ))
}

/// Delete a chat the authenticated user participates in
pub async fn delete_chat(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(chat_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let chat_id = parse_snowflake("chat_id", &chat_id)?;

    chat_service(&state)
        .delete_chat(chat_id, auth.user_id)
        .await
        .map_err(|e| match e {
            crate::application::services::ChatError::NotFound => {
                AppError::NotFound("Chat not found".into())
            }
            crate::application::services::ChatError::NotParticipant => {
                AppError::Forbidden("You can only delete chats you participate in.".into())
            }
            e => AppError::Internal(e.to_string()),
        })?;

    Ok(StatusCode::NO_CONTENT)
}

/// List a chat's messages in chronological order
pub async fn list_chat_messages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Host(host): Host,
    Path(chat_id): Path<String>,
) -> Result<Json<ChatMessagesResponse>, AppError> {
    let chat_id = parse_snowflake("chat_id", &chat_id)?;

    let messages = chat_service(&state)
        .chat_messages(chat_id, auth.user_id)
        .await
        .map_err(|e| match e {
            crate::application::services::ChatError::NotFound => {
                AppError::NotFound("Chat not found".into())
            }
            crate::application::services::ChatError::NotParticipant => {
                AppError::Forbidden("You are not a participant of this chat.".into())
            }
            e => AppError::Internal(e.to_string()),
        })?;

    let urls = UrlContext::new(state.settings.is_production(), host);
    let messages: Vec<MessageResponse> = messages
        .iter()
        .map(|details| MessageResponse::from_details(details, &urls))
        .collect();

    Ok(Json(ChatMessagesResponse {
        success: true,
        messages,
    }))
}
