//! Skill-exchange listings, their delivery format and the browse filter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Offer delivery format matching the database VARCHAR constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LearningFormat {
    #[default]
    Online,
    Offline,
    Both,
}

impl LearningFormat {
    /// Parse the stored column value; anything unknown falls back to online.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "offline" => Self::Offline,
            "both" => Self::Both,
            _ => Self::Online,
        }
    }

    /// The value written to the `learning_format` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Both => "both",
        }
    }
}

impl std::fmt::Display for LearningFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A published skill-exchange listing.
///
/// Maps to the `offers` table:
/// - id: BIGINT PRIMARY KEY, snowflake
/// - user_id: BIGINT NOT NULL REFERENCES users(id)
/// - title: VARCHAR(200) NOT NULL
/// - description: TEXT NOT NULL
/// - learning_format: VARCHAR(10) NOT NULL DEFAULT 'online'
/// - location: VARCHAR(200) NULL
/// - is_active: BOOLEAN NOT NULL DEFAULT TRUE
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - updated_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
///
/// Skill associations live in `offer_skills_to_learn` and
/// `offer_skills_to_teach` and are loaded separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    /// Snowflake id, also the primary key
    pub id: i64,

    /// Owner of the offer
    pub user_id: i64,

    /// Short headline
    pub title: String,

    /// Free-form description
    pub description: String,

    /// How the exchange takes place
    pub learning_format: LearningFormat,

    /// Meeting location for offline exchanges
    pub location: Option<String>,

    /// Soft-delete flag; inactive offers are hidden from listings
    /// but stay fetchable by ID
    pub is_active: bool,

    /// Creation timestamp (listing order, newest first)
    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Offer {
    /// Whether `user_id` owns this offer.
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }
}

impl Default for Offer {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            user_id: 0,
            title: String::new(),
            description: String::new(),
            learning_format: LearningFormat::default(),
            location: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Listing filter for browsing offers.
///
/// Both filters compose with AND; each is skipped when `None`.
#[derive(Debug, Clone, Default)]
pub struct OfferFilter {
    /// Exact skill names; an offer matches when any name appears in its
    /// learn set or its teach set
    pub skills: Option<Vec<String>>,

    /// Case-insensitive substring over title or description
    pub search: Option<String>,
}

/// Data access contract for offers.
#[async_trait]
pub trait OfferRepository: Send + Sync {
    /// Find an offer by id regardless of its active flag.
    async fn find_by_id(&self, id: i64) -> Result<Option<Offer>, AppError>;

    /// Active offers matching the filter, newest first.
    async fn list_active(&self, filter: &OfferFilter) -> Result<Vec<Offer>, AppError>;

    /// Insert an offer with its service-generated id.
    async fn create(&self, offer: &Offer) -> Result<Offer, AppError>;

    /// Update an existing offer's scalar fields.
    async fn update(&self, offer: &Offer) -> Result<Offer, AppError>;

    /// Soft delete: clear the active flag, keep the row.
    async fn deactivate(&self, id: i64) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("online" => LearningFormat::Online)]
    #[test_case("OFFLINE" => LearningFormat::Offline)]
    #[test_case("Both" => LearningFormat::Both)]
    #[test_case("weird" => LearningFormat::Online; "unknown defaults to online")]
    fn test_learning_format_from_str(s: &str) -> LearningFormat {
        LearningFormat::from_str(s)
    }

    #[test]
    fn test_learning_format_roundtrip() {
        for format in [
            LearningFormat::Online,
            LearningFormat::Offline,
            LearningFormat::Both,
        ] {
            assert_eq!(LearningFormat::from_str(format.as_str()), format);
        }
    }

    #[test]
    fn test_learning_format_serializes_lowercase() {
        let json = serde_json::to_string(&LearningFormat::Both).unwrap();
        assert_eq!(json, "\"both\"");
    }

    #[test]
    fn test_default_offer_is_active() {
        assert!(Offer::default().is_active);
    }

    #[test]
    fn test_ownership_check() {
        let offer = Offer {
            user_id: 7,
            ..Offer::default()
        };
        assert!(offer.is_owned_by(7));
        assert!(!offer.is_owned_by(8));
    }
}
