//! Offer Repository Implementation
//!
//! PostgreSQL-backed offer storage, including the filtered listing query.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{LearningFormat, Offer, OfferFilter, OfferRepository};
use crate::shared::error::AppError;

/// Row shape of the offers table.
#[derive(Debug, sqlx::FromRow)]
struct OfferRow {
    id: i64,
    user_id: i64,
    title: String,
    description: String,
    learning_format: String,
    location: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OfferRow {
    fn into_offer(self) -> Offer {
        Offer {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            learning_format: LearningFormat::from_str(&self.learning_format),
            location: self.location,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Build an ILIKE pattern from a raw search term, escaping the LIKE
/// metacharacters so user input matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Offer repository backed by PostgreSQL.
#[derive(Clone)]
pub struct PgOfferRepository {
    pool: PgPool,
}

impl PgOfferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OfferRepository for PgOfferRepository {
    /// Find an offer by ID regardless of its active flag.
    async fn find_by_id(&self, id: i64) -> Result<Option<Offer>, AppError> {
        let row = sqlx::query_as::<_, OfferRow>(
            r#"
            SELECT id, user_id, title, description, learning_format, location,
                   is_active, created_at, updated_at
            FROM offers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_offer()))
    }

    /// Active offers matching the filter, newest first.
    ///
    /// The skill filter matches when any requested name appears in the
    /// offer's learn set OR its teach set; both filters compose with AND.
    async fn list_active(&self, filter: &OfferFilter) -> Result<Vec<Offer>, AppError> {
        let skills: Option<Vec<String>> = filter.skills.clone();
        let search: Option<String> = filter.search.as_deref().map(like_pattern);

        let rows = sqlx::query_as::<_, OfferRow>(
            r#"
            SELECT o.id, o.user_id, o.title, o.description, o.learning_format,
                   o.location, o.is_active, o.created_at, o.updated_at
            FROM offers o
            WHERE o.is_active = TRUE
              AND ($1::TEXT[] IS NULL
                   OR EXISTS (
                       SELECT 1
                       FROM offer_skills_to_learn l
                       JOIN skills s ON s.id = l.skill_id
                       WHERE l.offer_id = o.id AND s.name = ANY($1))
                   OR EXISTS (
                       SELECT 1
                       FROM offer_skills_to_teach t
                       JOIN skills s ON s.id = t.skill_id
                       WHERE t.offer_id = o.id AND s.name = ANY($1)))
              AND ($2::TEXT IS NULL OR o.title ILIKE $2 OR o.description ILIKE $2)
            ORDER BY o.created_at DESC, o.id DESC
            "#,
        )
        .bind(skills)
        .bind(search)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_offer()).collect())
    }

    /// Create a new offer.
    async fn create(&self, offer: &Offer) -> Result<Offer, AppError> {
        let row = sqlx::query_as::<_, OfferRow>(
            r#"
            INSERT INTO offers (id, user_id, title, description, learning_format,
                                location, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, title, description, learning_format, location,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(offer.id)
        .bind(offer.user_id)
        .bind(&offer.title)
        .bind(&offer.description)
        .bind(offer.learning_format.as_str())
        .bind(&offer.location)
        .bind(offer.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_offer())
    }

    /// Update an existing offer's scalar fields.
    async fn update(&self, offer: &Offer) -> Result<Offer, AppError> {
        let row = sqlx::query_as::<_, OfferRow>(
            r#"
            UPDATE offers
            SET title = $2,
                description = $3,
                learning_format = $4,
                location = $5,
                is_active = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, title, description, learning_format, location,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(offer.id)
        .bind(&offer.title)
        .bind(&offer.description)
        .bind(offer.learning_format.as_str())
        .bind(&offer.location)
        .bind(offer.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Offer with id {} not found", offer.id)))?;

        Ok(row.into_offer())
    }

    /// Soft delete: clear the active flag, keep the row.
    async fn deactivate(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE offers SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Offer with id {} not found", id)));
        }

        Ok(())
    }
}
