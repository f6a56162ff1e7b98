//! Authentication Service
//!
//! Handles registration, login by username, refresh token rotation and
//! session revocation.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::JwtSettings;
use crate::domain::{Session, SessionRepository, User, UserRepository};
use crate::shared::snowflake::SnowflakeGenerator;

/// Account lifecycle operations, abstracted for handler tests
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new user account
    async fn register(&self, data: RegisterData) -> Result<User, AuthError>;

    /// Authenticate by username and password, opening a session
    async fn login(&self, username: &str, password: &str) -> Result<(User, AuthTokens), AuthError>;

    /// Revoke the session behind a refresh token (idempotent)
    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError>;

    /// Rotate a valid refresh token into a fresh token pair
    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AuthError>;
}

/// Registration input
#[derive(Debug, Clone)]
pub struct RegisterData {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Token pair issued on login and refresh
#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

/// Claims carried by an access token. `sub` holds the user id as a
/// decimal string; `exp` and `iat` are unix timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Errors surfaced by the auth operations
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Unable to log in with provided credentials.")]
    InvalidCredentials,

    #[error("User account is disabled.")]
    AccountDisabled,

    #[error("Username already exists")]
    UsernameExists,

    #[error("Email already exists")]
    EmailExists,

    #[error("Session not found or expired")]
    SessionNotFound,

    #[error("Token expired")]
    TokenExpired,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Production [`AuthService`] over the user and session repositories
pub struct AuthServiceImpl<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    id_generator: Arc<SnowflakeGenerator>,
    jwt_settings: JwtSettings,
}

impl<U, S> AuthServiceImpl<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        session_repo: Arc<S>,
        id_generator: Arc<SnowflakeGenerator>,
        jwt_settings: JwtSettings,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            id_generator,
            jwt_settings,
        }
    }

    /// Argon2id hash with a fresh random salt
    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Check a candidate password against the stored hash
    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Sign an access token and mint an opaque refresh token
    fn generate_tokens(&self, user_id: i64) -> Result<AuthTokens, AuthError> {
        let now = Utc::now();
        let access_expiry = now + Duration::minutes(self.jwt_settings.access_token_expiry_minutes);

        let claims = Claims {
            sub: user_id.to_string(),
            exp: access_expiry.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_settings.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("Token generation failed: {}", e)))?;

        // Opaque refresh token; only its hash is ever persisted
        let refresh_token = format!("{}.{}", uuid::Uuid::new_v4(), uuid::Uuid::new_v4());

        Ok(AuthTokens {
            access_token,
            refresh_token,
            expires_in: self.jwt_settings.access_token_expiry_minutes * 60,
            token_type: "Bearer".to_string(),
        })
    }

    /// SHA-256 digest stored in place of the refresh token
    fn hash_refresh_token(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Persist a session row for a freshly issued refresh token
    async fn open_session(&self, user_id: i64, refresh_token: &str) -> Result<(), AuthError> {
        let token_hash = self.hash_refresh_token(refresh_token);
        let session = Session::new(
            user_id,
            token_hash,
            Utc::now() + Duration::days(self.jwt_settings.refresh_token_expiry_days),
        );

        self.session_repo
            .create(&session)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl<U, S> AuthService for AuthServiceImpl<U, S>
where
    U: UserRepository + 'static,
    S: SessionRepository + 'static,
{
    async fn register(&self, data: RegisterData) -> Result<User, AuthError> {
        if self
            .user_repo
            .username_exists(&data.username)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
        {
            return Err(AuthError::UsernameExists);
        }

        if let Some(email) = &data.email {
            if self
                .user_repo
                .email_exists(email)
                .await
                .map_err(|e| AuthError::Internal(e.to_string()))?
            {
                return Err(AuthError::EmailExists);
            }
        }

        let password_hash = self.hash_password(&data.password)?;

        let now = Utc::now();
        let user = User {
            id: self.id_generator.generate(),
            avatar_seed: data.username.clone(),
            username: data.username,
            email: data.email,
            password_hash,
            first_name: data.first_name,
            last_name: data.last_name,
            photo_path: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.user_repo
            .create(&user)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    async fn login(&self, username: &str, password: &str) -> Result<(User, AuthTokens), AuthError> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        let tokens = self.generate_tokens(user.id)?;
        self.open_session(user.id, &tokens.refresh_token).await?;

        Ok((user, tokens))
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let token_hash = self.hash_refresh_token(refresh_token);

        let session = self
            .session_repo
            .find_by_token_hash(&token_hash)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        // Unknown tokens are fine; logout never fails on a stale client
        if let Some(session) = session {
            self.session_repo
                .revoke(session.id)
                .await
                .map_err(|e| AuthError::Internal(e.to_string()))?;
        }

        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        let token_hash = self.hash_refresh_token(refresh_token);

        let session = self
            .session_repo
            .find_by_token_hash(&token_hash)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::SessionNotFound)?;

        if !session.is_valid() {
            return Err(AuthError::TokenExpired);
        }

        // Rotation: the old refresh token dies with its session
        let tokens = self.generate_tokens(session.user_id)?;
        self.session_repo
            .revoke(session.id)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        self.open_session(session.user_id, &tokens.refresh_token)
            .await?;

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::infrastructure::repositories::test_repos::{
        MemorySessionRepository, MemoryUserRepository,
    };

    fn test_service() -> AuthServiceImpl<MemoryUserRepository, MemorySessionRepository> {
        let jwt = JwtSettings {
            secret: "0123456789abcdef0123456789abcdef".into(),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
        };
        AuthServiceImpl::new(
            Arc::new(MemoryUserRepository::default()),
            Arc::new(MemorySessionRepository::default()),
            Arc::new(SnowflakeGenerator::new(1, 1)),
            jwt,
        )
    }

    fn register_data(username: &str) -> RegisterData {
        RegisterData {
            username: username.into(),
            password: "correct horse".into(),
            email: Some(format!("{}@example.com", username)),
            first_name: None,
            last_name: None,
        }
    }

    #[tokio::test]
    async fn register_seeds_avatar_from_username() {
        let service = test_service();

        let user = service.register(register_data("marta")).await.unwrap();

        assert_eq!(user.username, "marta");
        assert_eq!(user.avatar_seed, "marta");
        assert!(user.is_active);
        assert_ne!(user.password_hash, "correct horse");
    }

    #[tokio::test]
    async fn register_rejects_duplicate_username() {
        let service = test_service();
        service.register(register_data("marta")).await.unwrap();

        let mut second = register_data("marta");
        second.email = Some("other@example.com".into());
        let err = service.register(second).await.unwrap_err();

        assert!(matches!(err, AuthError::UsernameExists));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let service = test_service();
        service.register(register_data("marta")).await.unwrap();

        let mut second = register_data("boris");
        second.email = Some("marta@example.com".into());
        let err = service.register(second).await.unwrap_err();

        assert!(matches!(err, AuthError::EmailExists));
    }

    #[tokio::test]
    async fn login_issues_bearer_tokens() {
        let service = test_service();
        service.register(register_data("marta")).await.unwrap();

        let (user, tokens) = service.login("marta", "correct horse").await.unwrap();

        assert_eq!(user.username, "marta");
        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.expires_in, 15 * 60);
        assert!(!tokens.access_token.is_empty());
    }

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let service = test_service();
        service.register(register_data("marta")).await.unwrap();

        let err = service.login("marta", "wrong password").await.unwrap_err();

        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_rejects_unknown_user() {
        let service = test_service();

        let err = service.login("nobody", "whatever!").await.unwrap_err();

        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_rejects_disabled_account() {
        let service = test_service();
        let user = service.register(register_data("marta")).await.unwrap();

        let disabled = User {
            is_active: false,
            ..user
        };
        service.user_repo.update(&disabled).await.unwrap();

        let err = service.login("marta", "correct horse").await.unwrap_err();
        assert!(matches!(err, AuthError::AccountDisabled));
    }

    #[tokio::test]
    async fn refresh_rotates_the_session() {
        let service = test_service();
        service.register(register_data("marta")).await.unwrap();
        let (_, tokens) = service.login("marta", "correct horse").await.unwrap();

        let rotated = service.refresh(&tokens.refresh_token).await.unwrap();
        assert_ne!(rotated.refresh_token, tokens.refresh_token);

        // The old token died with the rotation
        let err = service.refresh(&tokens.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::SessionNotFound));

        // The new one still works
        service.refresh(&rotated.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn logout_revokes_and_is_idempotent() {
        let service = test_service();
        service.register(register_data("marta")).await.unwrap();
        let (_, tokens) = service.login("marta", "correct horse").await.unwrap();

        service.logout(&tokens.refresh_token).await.unwrap();

        let err = service.refresh(&tokens.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::SessionNotFound));

        // Logging out again with the same token is still ok
        service.logout(&tokens.refresh_token).await.unwrap();
    }
}
