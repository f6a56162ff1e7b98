//! Authentication Middleware
//!
//! Bearer-token gate in front of the protected route groups.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::application::services::Claims;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Caller identity, inserted into request extensions after validation
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
}

/// Decode and validate an access token, returning the authenticated user.
///
/// Shared between the auth middleware and the event stream endpoint, which
/// also accepts its token via query parameter.
pub fn decode_token(secret: &str, token: &str) -> Result<AuthUser, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Unauthorized("Token expired".into())
        }
        _ => AppError::Unauthorized("Invalid token".into()),
    })?;

    let user_id: i64 = token_data
        .claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthorized("Invalid token claims".into()))?;

    Ok(AuthUser { user_id })
}

/// Reject the request unless it carries a valid `Authorization: Bearer` token
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".into()))?;

    let auth_user = decode_token(&state.settings.jwt.secret, token)?;

    // Handlers read the caller via Extension<AuthUser>
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}
