//! Response DTOs
//!
//! Data structures for API response bodies. Ids are serialized as strings
//! and timestamps as RFC 3339; media paths become absolute URLs through
//! the per-request [`UrlContext`].

use serde::Serialize;

use crate::application::services::{
    AuthTokens, ChatDetails, MessageDetails, OfferDetails, UserProfile,
};
use crate::domain::{LearningFormat, Skill, User};
use crate::infrastructure::media;

/// Per-request context for building absolute media URLs.
///
/// Carries the request `Host` header and the environment's scheme choice
/// so responses (and pushed chat summaries) can link stored images.
#[derive(Debug, Clone)]
pub struct UrlContext {
    production: bool,
    host: String,
}

impl UrlContext {
    pub fn new(production: bool, host: impl Into<String>) -> Self {
        Self {
            production,
            host: host.into(),
        }
    }

    /// Absolute URL for a media-root relative path.
    pub fn media_url(&self, path: &str) -> String {
        media::absolute_url(self.production, &self.host, path)
    }
}

/// Skill as embedded in profiles and offers
#[derive(Debug, Serialize)]
pub struct SkillResponse {
    pub id: String,
    pub name: String,
}

impl From<Skill> for SkillResponse {
    fn from(skill: Skill) -> Self {
        Self {
            id: skill.id.to_string(),
            name: skill.name,
        }
    }
}

/// Full user shape embedded in profiles, offers and messages
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    /// Absolute photo URL, null when no photo was uploaded
    pub photo: Option<String>,
    pub skillset: Vec<SkillResponse>,
    pub avatar_text: String,
    pub avatar_seed: String,
    pub full_name: String,
    pub created_at: String,
}

impl UserResponse {
    pub fn from_profile(profile: &UserProfile, urls: &UrlContext) -> Self {
        let user = &profile.user;
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            name: user.first_name.clone(),
            surname: user.last_name.clone(),
            photo: user.photo_path.as_deref().map(|p| urls.media_url(p)),
            skillset: profile
                .skills
                .iter()
                .cloned()
                .map(SkillResponse::from)
                .collect(),
            avatar_text: user.avatar_text(),
            avatar_seed: user.avatar_seed.clone(),
            full_name: user.full_name(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Reduced counterpart shape inside chat summaries
#[derive(Debug, Serialize)]
pub struct ChatParticipantResponse {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub avatar_text: String,
    pub photo: Option<String>,
}

impl ChatParticipantResponse {
    pub fn from_user(user: &User, urls: &UrlContext) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            name: user.first_name.clone(),
            surname: user.last_name.clone(),
            avatar_text: user.avatar_text(),
            photo: user.photo_path.as_deref().map(|p| urls.media_url(p)),
        }
    }
}

/// Message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub chat: String,
    pub sender: UserResponse,
    pub text: String,
    /// Absolute image URL; `image_url` repeats it for older clients
    pub image: Option<String>,
    pub image_url: Option<String>,
    pub created_at: String,
    pub is_read: bool,
}

impl MessageResponse {
    pub fn from_details(details: &MessageDetails, urls: &UrlContext) -> Self {
        let image = details
            .message
            .image_path
            .as_deref()
            .map(|p| urls.media_url(p));
        Self {
            id: details.message.id.to_string(),
            chat: details.message.chat_id.to_string(),
            sender: UserResponse::from_profile(&details.sender, urls),
            text: details.message.text.clone(),
            image: image.clone(),
            image_url: image,
            created_at: details.message.created_at.to_rfc3339(),
            is_read: details.message.is_read,
        }
    }
}

/// Chat summary response, viewer-dependent
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub id: String,
    pub participants: Vec<UserResponse>,
    pub other_participant: Option<ChatParticipantResponse>,
    pub last_message: Option<MessageResponse>,
    pub unread_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl ChatResponse {
    pub fn from_details(details: &ChatDetails, urls: &UrlContext) -> Self {
        Self {
            id: details.chat.id.to_string(),
            participants: details
                .participants
                .iter()
                .map(|p| UserResponse::from_profile(p, urls))
                .collect(),
            other_participant: details
                .other_participant
                .as_ref()
                .map(|u| ChatParticipantResponse::from_user(u, urls)),
            last_message: details
                .last_message
                .as_ref()
                .map(|m| MessageResponse::from_details(m, urls)),
            unread_count: details.unread_count,
            created_at: details.chat.created_at.to_rfc3339(),
            updated_at: details.chat.updated_at.to_rfc3339(),
        }
    }
}

/// Offer response
#[derive(Debug, Serialize)]
pub struct OfferResponse {
    pub id: String,
    pub user: UserResponse,
    pub title: String,
    pub description: String,
    pub skills_to_learn: Vec<SkillResponse>,
    pub skills_to_teach: Vec<SkillResponse>,
    pub learning_format: LearningFormat,
    pub location: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl OfferResponse {
    pub fn from_details(details: &OfferDetails, urls: &UrlContext) -> Self {
        Self {
            id: details.offer.id.to_string(),
            user: UserResponse::from_profile(&details.owner, urls),
            title: details.offer.title.clone(),
            description: details.offer.description.clone(),
            skills_to_learn: details
                .skills_to_learn
                .iter()
                .cloned()
                .map(SkillResponse::from)
                .collect(),
            skills_to_teach: details
                .skills_to_teach
                .iter()
                .cloned()
                .map(SkillResponse::from)
                .collect(),
            learning_format: details.offer.learning_format,
            location: details.offer.location.clone(),
            is_active: details.offer.is_active,
            created_at: details.offer.created_at.to_rfc3339(),
            updated_at: details.offer.updated_at.to_rfc3339(),
        }
    }
}

/// Reduced user in the signup envelope
#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
}

/// POST /api/auth/signup envelope
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub success: bool,
    pub message: String,
    pub user: RegisteredUser,
}

impl SignupResponse {
    pub fn new(user: &User) -> Self {
        Self {
            success: true,
            message: "User registered successfully".into(),
            user: RegisteredUser {
                id: user.id.to_string(),
                username: user.username.clone(),
                email: user.email.clone(),
            },
        }
    }
}

/// Reduced user in the signin envelope
#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// POST /api/auth/signin envelope
#[derive(Debug, Serialize)]
pub struct SigninResponse {
    pub success: bool,
    pub message: String,
    pub user: SessionUser,
    pub session: AuthTokens,
}

impl SigninResponse {
    pub fn new(user: &User, session: AuthTokens) -> Self {
        Self {
            success: true,
            message: "Login successful".into(),
            user: SessionUser {
                id: user.id.to_string(),
                username: user.username.clone(),
                email: user.email.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
            },
            session,
        }
    }
}

/// Plain success acknowledgement
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub success: bool,
    pub message: String,
}

impl AckResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// GET /api/auth/profile envelope
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: UserResponse,
}

/// PUT /api/auth/profile envelope
#[derive(Debug, Serialize)]
pub struct ProfileUpdatedResponse {
    pub success: bool,
    pub message: String,
    pub user: UserResponse,
}

/// GET /api/chats/{id}/messages envelope
#[derive(Debug, Serialize)]
pub struct ChatMessagesResponse {
    pub success: bool,
    pub messages: Vec<MessageResponse>,
}
