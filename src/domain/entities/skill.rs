//! Skill entity and repository trait.
//!
//! Maps to the `skills` table in the database schema.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A named skill shared by user profiles and offers.
///
/// Maps to the `skills` table:
/// - id: BIGINT PRIMARY KEY, snowflake
/// - name: VARCHAR(255) NOT NULL UNIQUE
///
/// Skills are never created directly through a dedicated endpoint; they come
/// into existence the first time a profile or an offer references their name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Skill {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Unique display name (exact-match vocabulary, case preserved)
    pub name: String,
}

impl Skill {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Which side of an offer a skill association belongs to.
///
/// Each side is backed by its own join table (`offer_skills_to_learn`,
/// `offer_skills_to_teach`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillSide {
    /// Skills the offer author wants to learn
    Learn,
    /// Skills the offer author is willing to teach
    Teach,
}

/// Repository trait for Skill data access operations.
#[async_trait]
pub trait SkillRepository: Send + Sync {
    /// All skills, ordered by name.
    async fn list_all(&self) -> Result<Vec<Skill>, AppError>;

    /// Look up skills by ID. Unknown IDs are absent from the result.
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Skill>, AppError>;

    /// Get an existing skill by exact name or insert a new row.
    ///
    /// `new_id` is used only when the insert path wins; concurrent callers
    /// with the same name converge on a single row.
    async fn get_or_create(&self, new_id: i64, name: &str) -> Result<Skill, AppError>;

    /// Skills attached to a user profile, ordered by name.
    async fn for_user(&self, user_id: i64) -> Result<Vec<Skill>, AppError>;

    /// Replace a user's skill set.
    async fn set_for_user(&self, user_id: i64, skill_ids: &[i64]) -> Result<(), AppError>;

    /// Skills attached to one side of a set of offers, as
    /// `(offer_id, skill)` pairs ordered by skill name.
    async fn for_offers(
        &self,
        offer_ids: &[i64],
        side: SkillSide,
    ) -> Result<Vec<(i64, Skill)>, AppError>;

    /// Replace one side of an offer's skill associations.
    async fn replace_for_offer(
        &self,
        offer_id: i64,
        side: SkillSide,
        skill_ids: &[i64],
    ) -> Result<(), AppError>;

    /// Append to one side of an offer's skill associations
    /// (existing links are kept, duplicates ignored).
    async fn add_for_offer(
        &self,
        offer_id: i64,
        side: SkillSide,
        skill_ids: &[i64],
    ) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sets_fields() {
        let skill = Skill::new(42, "rust");
        assert_eq!(skill.id, 42);
        assert_eq!(skill.name, "rust");
    }
}
