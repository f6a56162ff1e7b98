//! Message Handlers
//!
//! Sending accepts either a JSON body or a multipart form with an
//! optional `image` part.

use std::sync::Arc;

use axum::{
    extract::multipart::{Field, Multipart},
    extract::{Extension, FromRequest, Path, Request, State},
    http::header::CONTENT_TYPE,
    http::StatusCode,
    Json,
};
use axum_extra::extract::Host;

use crate::application::dto::request::SendMessageRequest;
use crate::application::dto::response::{AckResponse, MessageResponse, UrlContext};
use crate::application::services::{
    MessageService, MessageServiceImpl, SendMessageData,
};
use crate::infrastructure::events::RedisEventPublisher;
use crate::infrastructure::media::{MediaStore, CHAT_IMAGES_DIR};
use crate::infrastructure::repositories::{
    PgChatRepository, PgMessageRepository, PgSkillRepository, PgUserRepository,
};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::parse_snowflake;
use crate::startup::AppState;

fn message_service(
    state: &AppState,
) -> MessageServiceImpl<
    PgMessageRepository,
    PgChatRepository,
    PgUserRepository,
    PgSkillRepository,
    RedisEventPublisher,
> {
    let message_repo = Arc::new(PgMessageRepository::new(state.db.clone()));
    let chat_repo = Arc::new(PgChatRepository::new(state.db.clone()));
    let user_repo = Arc::new(PgUserRepository::new(state.db.clone()));
    let skill_repo = Arc::new(PgSkillRepository::new(state.db.clone()));
    let publisher = Arc::new(RedisEventPublisher::new(state.redis.clone()));
    MessageServiceImpl::new(
        message_repo,
        chat_repo,
        user_repo,
        skill_repo,
        publisher,
        state.snowflake.clone(),
    )
}

/// Send a message into a chat
pub async fn send_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Host(host): Host,
    request: Request,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    // Multipart carries the same fields as the JSON body plus `image`
    let (body, image_path) = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::Validation(e.to_string()))?;
        parse_message_form(multipart, &state.media).await?
    } else {
        let Json(body) = Json::<SendMessageRequest>::from_request(request, &state)
            .await
            .map_err(|e| AppError::Validation(e.to_string()))?;
        (body, None)
    };

    let chat_id = match body.chat.as_deref() {
        Some(raw) => parse_snowflake("chat", raw)?,
        None => return Err(AppError::Validation("Chat ID is required".into())),
    };

    let urls = UrlContext::new(state.settings.is_production(), host);
    let details = message_service(&state)
        .send_message(
            auth.user_id,
            SendMessageData {
                chat_id,
                text: body.text,
                image_path,
            },
            &urls,
        )
        .await
        .map_err(|e| match e {
            crate::application::services::MessageError::ChatAccess => {
                AppError::Validation(e.to_string())
            }
            e => AppError::Internal(e.to_string()),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::from_details(&details, &urls)),
    ))
}

/// Mark a message as read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(message_id): Path<String>,
) -> Result<Json<AckResponse>, AppError> {
    let message_id = parse_snowflake("message_id", &message_id)?;

    message_service(&state)
        .mark_read(message_id, auth.user_id)
        .await
        .map_err(|e| match e {
            crate::application::services::MessageError::NotFound => {
                AppError::NotFound("Message not found".into())
            }
            crate::application::services::MessageError::AccessDenied => {
                AppError::Forbidden("Access denied".into())
            }
            e => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(AckResponse::new("Message marked as read")))
}

/// Read message fields out of a multipart form, storing the image as a
/// side effect.
async fn parse_message_form(
    mut multipart: Multipart,
    media: &MediaStore,
) -> Result<(SendMessageRequest, Option<String>), AppError> {
    let mut chat = None;
    let mut text = String::new();
    let mut image_path = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "image" => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::Validation("image: file name is required".into()))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("image: {}", e)))?;
                image_path = Some(media.save_image(CHAT_IMAGES_DIR, &file_name, &bytes).await?);
            }
            "chat" => chat = Some(text_part(field, "chat").await?),
            "text" => text = text_part(field, "text").await?,
            _ => {}
        }
    }

    Ok((SendMessageRequest { chat, text }, image_path))
}

/// Decode one multipart part as UTF-8 text
async fn text_part(field: Field<'_>, name: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("{}: {}", name, e)))
}
