//! Skill Repository Implementation
//!
//! PostgreSQL-backed storage for the shared skill vocabulary and its
//! profile and offer associations.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{Skill, SkillRepository, SkillSide};
use crate::shared::error::AppError;

/// Row shape of the skills table.
#[derive(Debug, sqlx::FromRow)]
struct SkillRow {
    id: i64,
    name: String,
}

impl SkillRow {
    fn into_skill(self) -> Skill {
        Skill {
            id: self.id,
            name: self.name,
        }
    }
}

/// Row shape for skill lookups grouped by offer.
#[derive(Debug, sqlx::FromRow)]
struct OfferSkillRow {
    offer_id: i64,
    id: i64,
    name: String,
}

/// Skill repository backed by PostgreSQL.
#[derive(Clone)]
pub struct PgSkillRepository {
    pool: PgPool,
}

impl PgSkillRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SkillRepository for PgSkillRepository {
    /// All skills, ordered by name.
    async fn list_all(&self) -> Result<Vec<Skill>, AppError> {
        let rows = sqlx::query_as::<_, SkillRow>("SELECT id, name FROM skills ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|r| r.into_skill()).collect())
    }

    /// Look up skills by ID; unknown IDs are skipped.
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Skill>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, SkillRow>(
            "SELECT id, name FROM skills WHERE id = ANY($1) ORDER BY name",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_skill()).collect())
    }

    /// Get an existing skill by exact name or insert a new row.
    ///
    /// The upsert makes concurrent callers with the same name converge on
    /// one row; the DO UPDATE clause is what lets RETURNING yield the
    /// existing row on conflict.
    async fn get_or_create(&self, new_id: i64, name: &str) -> Result<Skill, AppError> {
        let row = sqlx::query_as::<_, SkillRow>(
            r#"
            INSERT INTO skills (id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name
            "#,
        )
        .bind(new_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_skill())
    }

    /// Skills attached to a user profile, ordered by name.
    async fn for_user(&self, user_id: i64) -> Result<Vec<Skill>, AppError> {
        let rows = sqlx::query_as::<_, SkillRow>(
            r#"
            SELECT s.id, s.name
            FROM user_skills us
            JOIN skills s ON s.id = us.skill_id
            WHERE us.user_id = $1
            ORDER BY s.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_skill()).collect())
    }

    /// Replace a user's skill set. Unknown skill IDs are skipped by the
    /// join against `skills`.
    async fn set_for_user(&self, user_id: i64, skill_ids: &[i64]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_skills WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO user_skills (user_id, skill_id)
            SELECT $1, s.id FROM skills s WHERE s.id = ANY($2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(skill_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Skills attached to one side of a set of offers.
    async fn for_offers(
        &self,
        offer_ids: &[i64],
        side: SkillSide,
    ) -> Result<Vec<(i64, Skill)>, AppError> {
        if offer_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = match side {
            SkillSide::Learn => {
                r#"
                SELECT l.offer_id, s.id, s.name
                FROM offer_skills_to_learn l
                JOIN skills s ON s.id = l.skill_id
                WHERE l.offer_id = ANY($1)
                ORDER BY s.name
                "#
            }
            SkillSide::Teach => {
                r#"
                SELECT t.offer_id, s.id, s.name
                FROM offer_skills_to_teach t
                JOIN skills s ON s.id = t.skill_id
                WHERE t.offer_id = ANY($1)
                ORDER BY s.name
                "#
            }
        };

        let rows = sqlx::query_as::<_, OfferSkillRow>(sql)
            .bind(offer_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.offer_id, Skill::new(r.id, r.name)))
            .collect())
    }

    /// Replace one side of an offer's skill associations.
    async fn replace_for_offer(
        &self,
        offer_id: i64,
        side: SkillSide,
        skill_ids: &[i64],
    ) -> Result<(), AppError> {
        let delete_sql = match side {
            SkillSide::Learn => "DELETE FROM offer_skills_to_learn WHERE offer_id = $1",
            SkillSide::Teach => "DELETE FROM offer_skills_to_teach WHERE offer_id = $1",
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(delete_sql)
            .bind(offer_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(insert_sql(side))
            .bind(offer_id)
            .bind(skill_ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Append to one side of an offer's skill associations.
    async fn add_for_offer(
        &self,
        offer_id: i64,
        side: SkillSide,
        skill_ids: &[i64],
    ) -> Result<(), AppError> {
        if skill_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(insert_sql(side))
            .bind(offer_id)
            .bind(skill_ids)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Shared insert statement for both association tables. Unknown skill IDs
/// are skipped by the join against `skills`; duplicates by ON CONFLICT.
fn insert_sql(side: SkillSide) -> &'static str {
    match side {
        SkillSide::Learn => {
            r#"
            INSERT INTO offer_skills_to_learn (offer_id, skill_id)
            SELECT $1, s.id FROM skills s WHERE s.id = ANY($2)
            ON CONFLICT DO NOTHING
            "#
        }
        SkillSide::Teach => {
            r#"
            INSERT INTO offer_skills_to_teach (offer_id, skill_id)
            SELECT $1, s.id FROM skills s WHERE s.id = ANY($2)
            ON CONFLICT DO NOTHING
            "#
        }
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would go here, requiring a test database
}
