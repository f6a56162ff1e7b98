//! Offer Service
//!
//! Listing, creation and lifecycle of skill-exchange offers. Offers are
//! soft deleted: delete clears `is_active`, browsing hides inactive rows
//! and fetching by id keeps working.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{
    LearningFormat, Offer, OfferFilter, OfferRepository, Skill, SkillRepository, SkillSide,
    UserRepository,
};
use crate::shared::snowflake::SnowflakeGenerator;

use super::user_service::{load_profiles, UserProfile};

/// An offer with everything a listing row shows: the owner's profile and
/// both resolved skill sides.
#[derive(Debug, Clone)]
pub struct OfferDetails {
    pub offer: Offer,
    pub owner: UserProfile,
    pub skills_to_learn: Vec<Skill>,
    pub skills_to_teach: Vec<Skill>,
}

/// Offer service trait
#[async_trait]
pub trait OfferService: Send + Sync {
    /// Active offers matching the filter, newest first
    async fn list_offers(&self, filter: OfferFilter) -> Result<Vec<OfferDetails>, OfferError>;

    /// Fetch one offer by id, active or not
    async fn get_offer(&self, offer_id: i64) -> Result<OfferDetails, OfferError>;

    /// Publish a new offer
    async fn create_offer(
        &self,
        user_id: i64,
        data: CreateOfferData,
    ) -> Result<OfferDetails, OfferError>;

    /// Apply a partial update to an owned offer
    async fn update_offer(
        &self,
        offer_id: i64,
        user_id: i64,
        data: UpdateOfferData,
    ) -> Result<OfferDetails, OfferError>;

    /// Soft delete an owned offer
    async fn delete_offer(&self, offer_id: i64, user_id: i64) -> Result<(), OfferError>;
}

/// Creation input. When a side carries free-text names they are resolved
/// against the catalog and take the place of that side's id list.
#[derive(Debug, Clone, Default)]
pub struct CreateOfferData {
    pub title: String,
    pub description: String,
    pub learning_format: Option<LearningFormat>,
    pub location: Option<String>,
    pub skills_to_learn_ids: Vec<i64>,
    pub skills_to_teach_ids: Vec<i64>,
    pub skills_to_learn_names: Vec<String>,
    pub skills_to_teach_names: Vec<String>,
}

/// Partial update input. `None` fields are left untouched.
///
/// The two skill inputs behave differently: an id list replaces the whole
/// side (an empty list clears it), while names are resolved and appended
/// to whatever the side already holds.
#[derive(Debug, Clone, Default)]
pub struct UpdateOfferData {
    pub title: Option<String>,
    pub description: Option<String>,
    pub learning_format: Option<LearningFormat>,
    pub location: Option<String>,
    pub is_active: Option<bool>,
    pub skills_to_learn_ids: Option<Vec<i64>>,
    pub skills_to_teach_ids: Option<Vec<i64>>,
    pub skills_to_learn_names: Vec<String>,
    pub skills_to_teach_names: Vec<String>,
}

/// Offer service errors
#[derive(Debug, thiserror::Error)]
pub enum OfferError {
    #[error("Offer not found")]
    NotFound,

    #[error("Not the offer owner")]
    NotOwner,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// OfferService implementation
pub struct OfferServiceImpl<O, U, K>
where
    O: OfferRepository,
    U: UserRepository,
    K: SkillRepository,
{
    offer_repo: Arc<O>,
    user_repo: Arc<U>,
    skill_repo: Arc<K>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<O, U, K> OfferServiceImpl<O, U, K>
where
    O: OfferRepository,
    U: UserRepository,
    K: SkillRepository,
{
    pub fn new(
        offer_repo: Arc<O>,
        user_repo: Arc<U>,
        skill_repo: Arc<K>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            offer_repo,
            user_repo,
            skill_repo,
            id_generator,
        }
    }

    /// Resolve free-text names to skill ids, creating catalog entries
    /// for names nobody used before.
    async fn resolve_names(&self, names: &[String]) -> Result<Vec<i64>, OfferError> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let skill = self
                .skill_repo
                .get_or_create(self.id_generator.generate(), name)
                .await
                .map_err(|e| OfferError::Internal(e.to_string()))?;
            ids.push(skill.id);
        }
        Ok(ids)
    }

    /// Batch-load owners and skill sides for a page of offers.
    async fn assemble_many(&self, offers: Vec<Offer>) -> Result<Vec<OfferDetails>, OfferError> {
        let offer_ids: Vec<i64> = offers.iter().map(|o| o.id).collect();
        let mut owner_ids: Vec<i64> = offers.iter().map(|o| o.user_id).collect();
        owner_ids.sort_unstable();
        owner_ids.dedup();

        let profiles = load_profiles(self.user_repo.as_ref(), self.skill_repo.as_ref(), &owner_ids)
            .await
            .map_err(|e| OfferError::Internal(e.to_string()))?;
        let profiles: HashMap<i64, UserProfile> =
            profiles.into_iter().map(|p| (p.user.id, p)).collect();

        let mut learn: HashMap<i64, Vec<Skill>> = HashMap::new();
        for (offer_id, skill) in self
            .skill_repo
            .for_offers(&offer_ids, SkillSide::Learn)
            .await
            .map_err(|e| OfferError::Internal(e.to_string()))?
        {
            learn.entry(offer_id).or_default().push(skill);
        }

        let mut teach: HashMap<i64, Vec<Skill>> = HashMap::new();
        for (offer_id, skill) in self
            .skill_repo
            .for_offers(&offer_ids, SkillSide::Teach)
            .await
            .map_err(|e| OfferError::Internal(e.to_string()))?
        {
            teach.entry(offer_id).or_default().push(skill);
        }

        let mut details = Vec::with_capacity(offers.len());
        for offer in offers {
            let owner = profiles
                .get(&offer.user_id)
                .cloned()
                .ok_or_else(|| OfferError::Internal(format!("Missing owner {}", offer.user_id)))?;
            let skills_to_learn = learn.remove(&offer.id).unwrap_or_default();
            let skills_to_teach = teach.remove(&offer.id).unwrap_or_default();
            details.push(OfferDetails {
                offer,
                owner,
                skills_to_learn,
                skills_to_teach,
            });
        }

        Ok(details)
    }

    async fn assemble_one(&self, offer: Offer) -> Result<OfferDetails, OfferError> {
        let mut details = self.assemble_many(vec![offer]).await?;
        details
            .pop()
            .ok_or_else(|| OfferError::Internal("Assembly dropped the offer".into()))
    }
}

#[async_trait]
impl<O, U, K> OfferService for OfferServiceImpl<O, U, K>
where
    O: OfferRepository + 'static,
    U: UserRepository + 'static,
    K: SkillRepository + 'static,
{
    async fn list_offers(&self, filter: OfferFilter) -> Result<Vec<OfferDetails>, OfferError> {
        let offers = self
            .offer_repo
            .list_active(&filter)
            .await
            .map_err(|e| OfferError::Internal(e.to_string()))?;

        self.assemble_many(offers).await
    }

    async fn get_offer(&self, offer_id: i64) -> Result<OfferDetails, OfferError> {
        let offer = self
            .offer_repo
            .find_by_id(offer_id)
            .await
            .map_err(|e| OfferError::Internal(e.to_string()))?
            .ok_or(OfferError::NotFound)?;

        self.assemble_one(offer).await
    }

    async fn create_offer(
        &self,
        user_id: i64,
        data: CreateOfferData,
    ) -> Result<OfferDetails, OfferError> {
        // Names, when given, stand in for the id list of their side
        let learn_ids = if data.skills_to_learn_names.is_empty() {
            data.skills_to_learn_ids
        } else {
            self.resolve_names(&data.skills_to_learn_names).await?
        };
        let teach_ids = if data.skills_to_teach_names.is_empty() {
            data.skills_to_teach_ids
        } else {
            self.resolve_names(&data.skills_to_teach_names).await?
        };

        let now = Utc::now();
        let offer = Offer {
            id: self.id_generator.generate(),
            user_id,
            title: data.title,
            description: data.description,
            learning_format: data.learning_format.unwrap_or_default(),
            location: data.location.and_then(non_empty),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let offer = self
            .offer_repo
            .create(&offer)
            .await
            .map_err(|e| OfferError::Internal(e.to_string()))?;

        self.skill_repo
            .replace_for_offer(offer.id, SkillSide::Learn, &learn_ids)
            .await
            .map_err(|e| OfferError::Internal(e.to_string()))?;
        self.skill_repo
            .replace_for_offer(offer.id, SkillSide::Teach, &teach_ids)
            .await
            .map_err(|e| OfferError::Internal(e.to_string()))?;

        self.assemble_one(offer).await
    }

    async fn update_offer(
        &self,
        offer_id: i64,
        user_id: i64,
        data: UpdateOfferData,
    ) -> Result<OfferDetails, OfferError> {
        let mut offer = self
            .offer_repo
            .find_by_id(offer_id)
            .await
            .map_err(|e| OfferError::Internal(e.to_string()))?
            .ok_or(OfferError::NotFound)?;

        if !offer.is_owned_by(user_id) {
            return Err(OfferError::NotOwner);
        }

        if let Some(title) = data.title {
            offer.title = title;
        }
        if let Some(description) = data.description {
            offer.description = description;
        }
        if let Some(format) = data.learning_format {
            offer.learning_format = format;
        }
        if let Some(location) = data.location {
            offer.location = non_empty(location);
        }
        if let Some(is_active) = data.is_active {
            offer.is_active = is_active;
        }
        offer.updated_at = Utc::now();

        let offer = self
            .offer_repo
            .update(&offer)
            .await
            .map_err(|e| OfferError::Internal(e.to_string()))?;

        // An explicit id list replaces the side, names append to it
        if let Some(ids) = data.skills_to_learn_ids {
            self.skill_repo
                .replace_for_offer(offer.id, SkillSide::Learn, &ids)
                .await
                .map_err(|e| OfferError::Internal(e.to_string()))?;
        }
        if let Some(ids) = data.skills_to_teach_ids {
            self.skill_repo
                .replace_for_offer(offer.id, SkillSide::Teach, &ids)
                .await
                .map_err(|e| OfferError::Internal(e.to_string()))?;
        }
        if !data.skills_to_learn_names.is_empty() {
            let ids = self.resolve_names(&data.skills_to_learn_names).await?;
            self.skill_repo
                .add_for_offer(offer.id, SkillSide::Learn, &ids)
                .await
                .map_err(|e| OfferError::Internal(e.to_string()))?;
        }
        if !data.skills_to_teach_names.is_empty() {
            let ids = self.resolve_names(&data.skills_to_teach_names).await?;
            self.skill_repo
                .add_for_offer(offer.id, SkillSide::Teach, &ids)
                .await
                .map_err(|e| OfferError::Internal(e.to_string()))?;
        }

        self.assemble_one(offer).await
    }

    async fn delete_offer(&self, offer_id: i64, user_id: i64) -> Result<(), OfferError> {
        let offer = self
            .offer_repo
            .find_by_id(offer_id)
            .await
            .map_err(|e| OfferError::Internal(e.to_string()))?
            .ok_or(OfferError::NotFound)?;

        if !offer.is_owned_by(user_id) {
            return Err(OfferError::NotOwner);
        }

        self.offer_repo
            .deactivate(offer_id)
            .await
            .map_err(|e| OfferError::Internal(e.to_string()))
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
