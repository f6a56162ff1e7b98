//! Skill Handlers

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::application::dto::response::SkillResponse;
use crate::application::services::{SkillService, SkillServiceImpl};
use crate::infrastructure::repositories::PgSkillRepository;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// List the whole skill vocabulary, name-ordered
pub async fn list_skills(
    State(state): State<AppState>,
) -> Result<Json<Vec<SkillResponse>>, AppError> {
    let skill_repo = Arc::new(PgSkillRepository::new(state.db.clone()));
    let skill_service = SkillServiceImpl::new(skill_repo);

    let skills = skill_service
        .list_skills()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let responses: Vec<SkillResponse> = skills.into_iter().map(SkillResponse::from).collect();

    Ok(Json(responses))
}
