//! Request DTOs
//!
//! Data structures for API request bodies and query strings.

use serde::Deserialize;
use validator::Validate;

use crate::domain::LearningFormat;
use crate::shared::validation::split_csv;

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    pub username: String,

    pub password: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[serde(default, rename = "name")]
    pub first_name: Option<String>,

    #[serde(default, rename = "surname")]
    pub last_name: Option<String>,
}

/// Login request. No shape validation: any mismatch reads as bad
/// credentials, never as a field error.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Refresh token request, also used for signout
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Skill names arrive either as a JSON list or as one comma-separated
/// string; both normalize to the same list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SkillNames {
    List(Vec<String>),
    Csv(String),
}

impl SkillNames {
    /// Trimmed, non-empty names in request order.
    pub fn into_names(self) -> Vec<String> {
        match self {
            Self::List(names) => names
                .into_iter()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect(),
            Self::Csv(raw) => split_csv(&raw),
        }
    }
}

/// Profile update request (JSON variant; the multipart variant carries
/// the same fields plus a `photo` image part)
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub name: Option<String>,
    pub surname: Option<String>,

    #[serde(default)]
    pub skill_names: Option<SkillNames>,

    #[serde(default)]
    pub skillset_ids: Option<Vec<String>>,
}

/// Create offer request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateOfferRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: String,

    pub learning_format: Option<LearningFormat>,
    pub location: Option<String>,

    #[serde(default)]
    pub skills_to_learn_ids: Vec<String>,

    #[serde(default)]
    pub skills_to_teach_ids: Vec<String>,

    #[serde(default)]
    pub skill_names_to_learn: Option<SkillNames>,

    #[serde(default)]
    pub skill_names_to_teach: Option<SkillNames>,
}

/// Update offer request. Skill id lists and name lists patch differently;
/// see the offer service.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateOfferRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: Option<String>,

    pub learning_format: Option<LearningFormat>,
    pub location: Option<String>,
    pub is_active: Option<bool>,

    pub skills_to_learn_ids: Option<Vec<String>>,
    pub skills_to_teach_ids: Option<Vec<String>>,

    #[serde(default)]
    pub skill_names_to_learn: Option<SkillNames>,

    #[serde(default)]
    pub skill_names_to_teach: Option<SkillNames>,
}

/// Create chat request
#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    #[serde(default)]
    pub participants: Vec<String>,
}

/// Send message request (JSON variant; the multipart variant carries the
/// same fields plus an `image` part)
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub chat: Option<String>,

    #[serde(default)]
    pub text: String,
}

/// Offer listing query parameters
#[derive(Debug, Default, Deserialize)]
pub struct OfferListQuery {
    /// Comma-separated exact skill names
    pub skills: Option<String>,

    /// Case-insensitive substring over title or description
    pub search: Option<String>,
}

/// SSE subscription query parameters
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Channel name, `chat-{id}`
    pub channel: String,

    /// Access token fallback for EventSource clients that cannot set
    /// an Authorization header
    pub token: Option<String>,
}
