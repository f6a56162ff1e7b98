//! Profile Handlers
//!
//! The update endpoint accepts either a JSON body or a multipart form;
//! the multipart variant additionally carries a `photo` image part.

use std::sync::Arc;

use axum::{
    extract::multipart::{Field, Multipart},
    extract::{Extension, FromRequest, Request, State},
    http::header::CONTENT_TYPE,
    Json,
};
use axum_extra::extract::Host;
use validator::Validate;

use crate::application::dto::request::{SkillNames, UpdateProfileRequest};
use crate::application::dto::response::{
    ProfileResponse, ProfileUpdatedResponse, UrlContext, UserResponse,
};
use crate::application::services::{UpdateProfileData, UserService, UserServiceImpl};
use crate::infrastructure::media::{MediaStore, USER_PHOTOS_DIR};
use crate::infrastructure::repositories::{PgSkillRepository, PgUserRepository};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::{parse_snowflake, validation_error};
use crate::startup::AppState;

/// Get the authenticated user's profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Host(host): Host,
) -> Result<Json<ProfileResponse>, AppError> {
    let user_repo = Arc::new(PgUserRepository::new(state.db.clone()));
    let skill_repo = Arc::new(PgSkillRepository::new(state.db.clone()));
    let user_service = UserServiceImpl::new(user_repo, skill_repo, state.snowflake.clone());

    let profile = user_service
        .get_profile(auth.user_id)
        .await
        .map_err(|e| match e {
            crate::application::services::UserError::NotFound => {
                AppError::NotFound("User not found".into())
            }
            e => AppError::Internal(e.to_string()),
        })?;

    let urls = UrlContext::new(state.settings.is_production(), host);
    Ok(Json(ProfileResponse {
        success: true,
        user: UserResponse::from_profile(&profile, &urls),
    }))
}

/// Update the authenticated user's profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Host(host): Host,
    request: Request,
) -> Result<Json<ProfileUpdatedResponse>, AppError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    // Multipart carries the same fields as the JSON body plus `photo`
    let (body, photo_path) = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::Validation(e.to_string()))?;
        parse_profile_form(multipart, &state.media).await?
    } else {
        let Json(body) = Json::<UpdateProfileRequest>::from_request(request, &state)
            .await
            .map_err(|e| AppError::Validation(e.to_string()))?;
        (body, None)
    };

    // Validate request
    body.validate().map_err(validation_error)?;

    let skillset_ids = match body.skillset_ids {
        Some(raw) => {
            let mut ids = Vec::with_capacity(raw.len());
            for value in &raw {
                ids.push(parse_snowflake("skillset_ids", value)?);
            }
            Some(ids)
        }
        None => None,
    };

    let update = UpdateProfileData {
        email: body.email,
        first_name: body.name,
        last_name: body.surname,
        photo_path,
        skill_names: body.skill_names.map(SkillNames::into_names),
        skillset_ids,
    };

    let user_repo = Arc::new(PgUserRepository::new(state.db.clone()));
    let skill_repo = Arc::new(PgSkillRepository::new(state.db.clone()));
    let user_service = UserServiceImpl::new(user_repo, skill_repo, state.snowflake.clone());

    let profile = user_service
        .update_profile(auth.user_id, update)
        .await
        .map_err(|e| match e {
            crate::application::services::UserError::NotFound => {
                AppError::NotFound("User not found".into())
            }
            crate::application::services::UserError::EmailTaken => {
                AppError::Conflict("Email is already in use".into())
            }
            e => AppError::Internal(e.to_string()),
        })?;

    let urls = UrlContext::new(state.settings.is_production(), host);
    Ok(Json(ProfileUpdatedResponse {
        success: true,
        message: "Profile updated successfully".into(),
        user: UserResponse::from_profile(&profile, &urls),
    }))
}

/// Read profile fields out of a multipart form, storing the photo as a
/// side effect.
async fn parse_profile_form(
    mut multipart: Multipart,
    media: &MediaStore,
) -> Result<(UpdateProfileRequest, Option<String>), AppError> {
    let mut body = UpdateProfileRequest::default();
    let mut skillset_ids: Option<Vec<String>> = None;
    let mut photo_path = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "photo" => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::Validation("photo: file name is required".into()))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("photo: {}", e)))?;
                photo_path = Some(media.save_image(USER_PHOTOS_DIR, &file_name, &bytes).await?);
            }
            "email" => body.email = Some(text_part(field, "email").await?),
            "name" => body.name = Some(text_part(field, "name").await?),
            "surname" => body.surname = Some(text_part(field, "surname").await?),
            "skill_names" => {
                body.skill_names = Some(SkillNames::Csv(text_part(field, "skill_names").await?));
            }
            // Repeatable field, one id per part
            "skillset_ids" => skillset_ids
                .get_or_insert_with(Vec::new)
                .push(text_part(field, "skillset_ids").await?),
            _ => {}
        }
    }

    body.skillset_ids = skillset_ids;
    Ok((body, photo_path))
}

/// Decode one multipart part as UTF-8 text
async fn text_part(field: Field<'_>, name: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("{}: {}", name, e)))
}
