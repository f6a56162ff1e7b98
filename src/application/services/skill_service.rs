//! Skill Service
//!
//! Read side of the shared skill catalog. Skills are created on the fly
//! by profile and offer updates, never through a dedicated endpoint.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Skill, SkillRepository};

/// Skill service trait
#[async_trait]
pub trait SkillService: Send + Sync {
    /// All skills, ordered by name
    async fn list_skills(&self) -> Result<Vec<Skill>, SkillError>;
}

/// Skill service errors
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    #[error("Internal error: {0}")]
    Internal(String),
}

/// SkillService implementation
pub struct SkillServiceImpl<K>
where
    K: SkillRepository,
{
    skill_repo: Arc<K>,
}

impl<K> SkillServiceImpl<K>
where
    K: SkillRepository,
{
    pub fn new(skill_repo: Arc<K>) -> Self {
        Self { skill_repo }
    }
}

#[async_trait]
impl<K> SkillService for SkillServiceImpl<K>
where
    K: SkillRepository + 'static,
{
    async fn list_skills(&self) -> Result<Vec<Skill>, SkillError> {
        self.skill_repo
            .list_all()
            .await
            .map_err(|e| SkillError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::infrastructure::repositories::test_repos::MemorySkillRepository;

    #[tokio::test]
    async fn list_skills_is_name_ordered() {
        let skills = Arc::new(MemorySkillRepository::default());
        skills.get_or_create(1, "Rust").await.unwrap();
        skills.get_or_create(2, "Baking").await.unwrap();
        skills.get_or_create(3, "Chess").await.unwrap();
        let service = SkillServiceImpl::new(skills);

        let all = service.list_skills().await.unwrap();

        let names: Vec<&str> = all.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Baking", "Chess", "Rust"]);
    }

    #[tokio::test]
    async fn list_skills_empty_catalog() {
        let service = SkillServiceImpl::new(Arc::new(MemorySkillRepository::default()));

        assert!(service.list_skills().await.unwrap().is_empty());
    }
}
