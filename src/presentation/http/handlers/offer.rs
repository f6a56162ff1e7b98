//! Offer Handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Host;
use validator::Validate;

use crate::application::dto::request::{
    CreateOfferRequest, OfferListQuery, SkillNames, UpdateOfferRequest,
};
use crate::application::dto::response::{OfferResponse, UrlContext};
use crate::application::services::{
    CreateOfferData, OfferService, OfferServiceImpl, UpdateOfferData,
};
use crate::domain::OfferFilter;
use crate::infrastructure::repositories::{
    PgOfferRepository, PgSkillRepository, PgUserRepository,
};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::{parse_snowflake, split_csv, validation_error};
use crate::startup::AppState;

fn offer_service(
    state: &AppState,
) -> OfferServiceImpl<PgOfferRepository, PgUserRepository, PgSkillRepository> {
    let offer_repo = Arc::new(PgOfferRepository::new(state.db.clone()));
    let user_repo = Arc::new(PgUserRepository::new(state.db.clone()));
    let skill_repo = Arc::new(PgSkillRepository::new(state.db.clone()));
    OfferServiceImpl::new(offer_repo, user_repo, skill_repo, state.snowflake.clone())
}

/// Parse a wire id list, rejecting non-numeric entries
fn parse_id_list(field: &str, values: &[String]) -> Result<Vec<i64>, AppError> {
    let mut ids = Vec::with_capacity(values.len());
    for value in values {
        ids.push(parse_snowflake(field, value)?);
    }
    Ok(ids)
}

/// List active offers, newest first
pub async fn list_offers(
    State(state): State<AppState>,
    Host(host): Host,
    Query(query): Query<OfferListQuery>,
) -> Result<Json<Vec<OfferResponse>>, AppError> {
    let filter = OfferFilter {
        skills: query.skills.as_deref().map(split_csv).filter(|s| !s.is_empty()),
        search: query.search.filter(|s| !s.trim().is_empty()),
    };

    let offers = offer_service(&state)
        .list_offers(filter)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let urls = UrlContext::new(state.settings.is_production(), host);
    let responses: Vec<OfferResponse> = offers
        .iter()
        .map(|details| OfferResponse::from_details(details, &urls))
        .collect();

    Ok(Json(responses))
}

/// Get one offer by id, active or not
pub async fn get_offer(
    State(state): State<AppState>,
    Host(host): Host,
    Path(offer_id): Path<String>,
) -> Result<Json<OfferResponse>, AppError> {
    let offer_id = parse_snowflake("offer_id", &offer_id)?;

    let details = offer_service(&state)
        .get_offer(offer_id)
        .await
        .map_err(|e| match e {
            crate::application::services::OfferError::NotFound => {
                AppError::NotFound("Offer not found".into())
            }
            e => AppError::Internal(e.to_string()),
        })?;

    let urls = UrlContext::new(state.settings.is_production(), host);
    Ok(Json(OfferResponse::from_details(&details, &urls)))
}

/// Publish a new offer
pub async fn create_offer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Host(host): Host,
    Json(body): Json<CreateOfferRequest>,
) -> Result<(StatusCode, Json<OfferResponse>), AppError> {
    // Validate request
    body.validate().map_err(validation_error)?;

    let data = CreateOfferData {
        title: body.title,
        description: body.description,
        learning_format: body.learning_format,
        location: body.location,
        skills_to_learn_ids: parse_id_list("skills_to_learn_ids", &body.skills_to_learn_ids)?,
        skills_to_teach_ids: parse_id_list("skills_to_teach_ids", &body.skills_to_teach_ids)?,
        skills_to_learn_names: body
            .skill_names_to_learn
            .map(SkillNames::into_names)
            .unwrap_or_default(),
        skills_to_teach_names: body
            .skill_names_to_teach
            .map(SkillNames::into_names)
            .unwrap_or_default(),
    };

    let details = offer_service(&state)
        .create_offer(auth.user_id, data)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let urls = UrlContext::new(state.settings.is_production(), host);
    Ok((
        StatusCode::CREATED,
        Json(OfferResponse::from_details(&details, &urls)),
    ))
}

/// Update an owned offer.
///
/// Explicit skill id lists replace that side's set, resolved names are
/// appended to it. Served for both PATCH and PUT.
pub async fn update_offer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Host(host): Host,
    Path(offer_id): Path<String>,
    Json(body): Json<UpdateOfferRequest>,
) -> Result<Json<OfferResponse>, AppError> {
    let offer_id = parse_snowflake("offer_id", &offer_id)?;

    // Validate request
    body.validate().map_err(validation_error)?;

    let data = UpdateOfferData {
        title: body.title,
        description: body.description,
        learning_format: body.learning_format,
        location: body.location,
        is_active: body.is_active,
        skills_to_learn_ids: body
            .skills_to_learn_ids
            .as_deref()
            .map(|ids| parse_id_list("skills_to_learn_ids", ids))
            .transpose()?,
        skills_to_teach_ids: body
            .skills_to_teach_ids
            .as_deref()
            .map(|ids| parse_id_list("skills_to_teach_ids", ids))
            .transpose()?,
        skills_to_learn_names: body
            .skill_names_to_learn
            .map(SkillNames::into_names)
            .unwrap_or_default(),
        skills_to_teach_names: body
            .skill_names_to_teach
            .map(SkillNames::into_names)
            .unwrap_or_default(),
    };

    let details = offer_service(&state)
        .update_offer(offer_id, auth.user_id, data)
        .await
        .map_err(|e| match e {
            crate::application::services::OfferError::NotFound => {
                AppError::NotFound("Offer not found".into())
            }
            crate::application::services::OfferError::NotOwner => {
                AppError::Forbidden("You can only update your own offers.".into())
            }
            e => AppError::Internal(e.to_string()),
        })?;

    let urls = UrlContext::new(state.settings.is_production(), host);
    Ok(Json(OfferResponse::from_details(&details, &urls)))
}

/// Soft delete an owned offer
pub async fn delete_offer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(offer_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let offer_id = parse_snowflake("offer_id", &offer_id)?;

    offer_service(&state)
        .delete_offer(offer_id, auth.user_id)
        .await
        .map_err(|e| match e {
            crate::application::services::OfferError::NotFound => {
                AppError::NotFound("Offer not found".into())
            }
            crate::application::services::OfferError::NotOwner => {
                AppError::Forbidden("You can only delete your own offers.".into())
            }
            e => AppError::Internal(e.to_string()),
        })?;

    Ok(StatusCode::NO_CONTENT)
}
