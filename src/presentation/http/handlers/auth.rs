//! Authentication Handlers
//!
//! The four public session endpoints: signup, signin, token refresh and
//! signout.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::application::dto::request::{LoginRequest, RefreshTokenRequest, RegisterRequest};
use crate::application::dto::response::{AckResponse, SigninResponse, SignupResponse};
use crate::application::services::{AuthService, AuthServiceImpl, AuthTokens, RegisterData};
use crate::infrastructure::repositories::{PgSessionRepository, PgUserRepository};
use crate::shared::error::AppError;
use crate::shared::validation::{validate_password, validate_username, validation_error};
use crate::startup::AppState;

fn auth_service(state: &AppState) -> AuthServiceImpl<PgUserRepository, PgSessionRepository> {
    let user_repo = Arc::new(PgUserRepository::new(state.db.clone()));
    let session_repo = Arc::new(PgSessionRepository::new(state.db.clone()));
    AuthServiceImpl::new(
        user_repo,
        session_repo,
        state.snowflake.clone(),
        state.settings.jwt.clone(),
    )
}

/// Create an account
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    body.validate().map_err(validation_error)?;
    validate_username(&body.username)?;
    validate_password(&body.password)?;

    let user = auth_service(&state)
        .register(RegisterData {
            username: body.username,
            password: body.password,
            email: body.email,
            first_name: body.first_name,
            last_name: body.last_name,
        })
        .await
        .map_err(|e| match e {
            crate::application::services::AuthError::UsernameExists => {
                AppError::Conflict("Username already exists".into())
            }
            crate::application::services::AuthError::EmailExists => {
                AppError::Conflict("Email already exists".into())
            }
            e => AppError::Internal(e.to_string()),
        })?;

    Ok((StatusCode::CREATED, Json(SignupResponse::new(&user))))
}

/// Exchange username and password for a token pair
pub async fn signin(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SigninResponse>, AppError> {
    let (user, tokens) = auth_service(&state)
        .login(&body.username, &body.password)
        .await
        .map_err(|e| match e {
            crate::application::services::AuthError::InvalidCredentials
            | crate::application::services::AuthError::AccountDisabled => {
                AppError::InvalidCredentials(e.to_string())
            }
            e => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(SigninResponse::new(&user, tokens)))
}

/// Rotate a refresh token into a fresh token pair
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<Json<AuthTokens>, AppError> {
    let tokens = auth_service(&state)
        .refresh(&body.refresh_token)
        .await
        .map_err(|e| match e {
            crate::application::services::AuthError::SessionNotFound => {
                AppError::Unauthorized("Invalid or expired refresh token".into())
            }
            crate::application::services::AuthError::TokenExpired => {
                AppError::Unauthorized("Refresh token expired".into())
            }
            e => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(tokens))
}

/// Revoke the refresh session.
///
/// Always succeeds; a stale or unknown token still gets a 200 so clients
/// can clear local state.
pub async fn signout(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<Json<AckResponse>, AppError> {
    let _ = auth_service(&state).logout(&body.refresh_token).await;

    Ok(Json(AckResponse::new("Logout successful")))
}
