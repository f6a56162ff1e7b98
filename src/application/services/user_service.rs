//! User Service
//!
//! Profile reads and partial profile updates, including the skillset
//! attached to a user.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{Skill, SkillRepository, User, UserRepository};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// A user together with the skills on their profile.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub user: User,
    pub skills: Vec<Skill>,
}

/// Load profiles for several users at once, preserving the repository's
/// id ordering.
pub(crate) async fn load_profiles(
    user_repo: &dyn UserRepository,
    skill_repo: &dyn SkillRepository,
    ids: &[i64],
) -> Result<Vec<UserProfile>, AppError> {
    let users = user_repo.find_many(ids).await?;

    let mut profiles = Vec::with_capacity(users.len());
    for user in users {
        let skills = skill_repo.for_user(user.id).await?;
        profiles.push(UserProfile { user, skills });
    }

    Ok(profiles)
}

/// User service trait
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get a profile by user ID
    async fn get_profile(&self, user_id: i64) -> Result<UserProfile, UserError>;

    /// Apply a partial profile update
    async fn update_profile(
        &self,
        user_id: i64,
        data: UpdateProfileData,
    ) -> Result<UserProfile, UserError>;
}

/// Partial update input. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileData {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Media-root relative path of a freshly stored photo
    pub photo_path: Option<String>,
    /// Free-text skill names; wins over `skillset_ids` when both are set
    pub skill_names: Option<Vec<String>>,
    /// Explicit skill id list replacing the current set
    pub skillset_ids: Option<Vec<i64>>,
}

/// User service errors
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("Email is already in use")]
    EmailTaken,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// UserService implementation
pub struct UserServiceImpl<U, K>
where
    U: UserRepository,
    K: SkillRepository,
{
    user_repo: Arc<U>,
    skill_repo: Arc<K>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<U, K> UserServiceImpl<U, K>
where
    U: UserRepository,
    K: SkillRepository,
{
    pub fn new(user_repo: Arc<U>, skill_repo: Arc<K>, id_generator: Arc<SnowflakeGenerator>) -> Self {
        Self {
            user_repo,
            skill_repo,
            id_generator,
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[async_trait]
impl<U, K> UserService for UserServiceImpl<U, K>
where
    U: UserRepository + 'static,
    K: SkillRepository + 'static,
{
    async fn get_profile(&self, user_id: i64) -> Result<UserProfile, UserError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?
            .ok_or(UserError::NotFound)?;

        let skills = self
            .skill_repo
            .for_user(user.id)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?;

        Ok(UserProfile { user, skills })
    }

    async fn update_profile(
        &self,
        user_id: i64,
        data: UpdateProfileData,
    ) -> Result<UserProfile, UserError> {
        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?
            .ok_or(UserError::NotFound)?;

        if let Some(email) = data.email {
            if user.email.as_deref() != Some(email.as_str())
                && self
                    .user_repo
                    .email_exists(&email)
                    .await
                    .map_err(|e| UserError::Internal(e.to_string()))?
            {
                return Err(UserError::EmailTaken);
            }
            user.email = Some(email);
        }

        if let Some(name) = data.first_name {
            user.first_name = non_empty(name);
        }
        if let Some(surname) = data.last_name {
            user.last_name = non_empty(surname);
        }
        if let Some(path) = data.photo_path {
            user.photo_path = Some(path);
        }
        user.updated_at = Utc::now();

        let user = self
            .user_repo
            .update(&user)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?;

        // Free-text names win over the explicit id list
        if let Some(names) = data.skill_names {
            let mut skill_ids = Vec::with_capacity(names.len());
            for name in &names {
                let skill = self
                    .skill_repo
                    .get_or_create(self.id_generator.generate(), name)
                    .await
                    .map_err(|e| UserError::Internal(e.to_string()))?;
                skill_ids.push(skill.id);
            }
            self.skill_repo
                .set_for_user(user.id, &skill_ids)
                .await
                .map_err(|e| UserError::Internal(e.to_string()))?;
        } else if let Some(ids) = data.skillset_ids {
            self.skill_repo
                .set_for_user(user.id, &ids)
                .await
                .map_err(|e| UserError::Internal(e.to_string()))?;
        }

        let skills = self
            .skill_repo
            .for_user(user.id)
            .await
            .map_err(|e| UserError::Internal(e.to_string()))?;

        Ok(UserProfile { user, skills })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::infrastructure::repositories::test_repos::{
        MemorySkillRepository, MemoryUserRepository,
    };

    struct Fixture {
        service: UserServiceImpl<MemoryUserRepository, MemorySkillRepository>,
        users: Arc<MemoryUserRepository>,
        skills: Arc<MemorySkillRepository>,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(MemoryUserRepository::default());
        let skills = Arc::new(MemorySkillRepository::default());
        let service = UserServiceImpl::new(
            users.clone(),
            skills.clone(),
            Arc::new(SnowflakeGenerator::new(1, 1)),
        );
        Fixture {
            service,
            users,
            skills,
        }
    }

    async fn seed_user(fixture: &Fixture, id: i64, username: &str) -> User {
        let user = User {
            id,
            username: username.to_string(),
            email: Some(format!("{}@example.com", username)),
            avatar_seed: username.to_string(),
            ..User::default()
        };
        fixture.users.create(&user).await.unwrap()
    }

    #[tokio::test]
    async fn get_profile_returns_skills_sorted_by_name() {
        let f = fixture();
        seed_user(&f, 1, "marta").await;
        let rust = f.skills.get_or_create(10, "Rust").await.unwrap();
        let chess = f.skills.get_or_create(11, "Chess").await.unwrap();
        f.skills.set_for_user(1, &[rust.id, chess.id]).await.unwrap();

        let profile = f.service.get_profile(1).await.unwrap();

        let names: Vec<&str> = profile.skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Chess", "Rust"]);
    }

    #[tokio::test]
    async fn get_profile_unknown_user() {
        let f = fixture();

        let err = f.service.get_profile(404).await.unwrap_err();

        assert!(matches!(err, UserError::NotFound));
    }

    #[tokio::test]
    async fn update_profile_blank_name_clears_the_field() {
        let f = fixture();
        seed_user(&f, 1, "marta").await;
        f.service
            .update_profile(
                1,
                UpdateProfileData {
                    first_name: Some("Marta".into()),
                    last_name: Some("Kovacs".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let profile = f
            .service
            .update_profile(
                1,
                UpdateProfileData {
                    last_name: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(profile.user.first_name.as_deref(), Some("Marta"));
        assert_eq!(profile.user.last_name, None);
    }

    #[tokio::test]
    async fn update_profile_rejects_taken_email() {
        let f = fixture();
        seed_user(&f, 1, "marta").await;
        seed_user(&f, 2, "boris").await;

        let err = f
            .service
            .update_profile(
                2,
                UpdateProfileData {
                    email: Some("marta@example.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::EmailTaken));
    }

    #[tokio::test]
    async fn update_profile_accepts_own_email_unchanged() {
        let f = fixture();
        seed_user(&f, 1, "marta").await;

        let profile = f
            .service
            .update_profile(
                1,
                UpdateProfileData {
                    email: Some("marta@example.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(profile.user.email.as_deref(), Some("marta@example.com"));
    }

    #[tokio::test]
    async fn update_profile_skill_names_create_and_replace() {
        let f = fixture();
        seed_user(&f, 1, "marta").await;
        let old = f.skills.get_or_create(10, "Weaving").await.unwrap();
        f.skills.set_for_user(1, &[old.id]).await.unwrap();

        let profile = f
            .service
            .update_profile(
                1,
                UpdateProfileData {
                    skill_names: Some(vec!["Rust".into(), "Chess".into()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let names: Vec<&str> = profile.skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Chess", "Rust"]);
    }

    #[tokio::test]
    async fn update_profile_names_win_over_id_list() {
        let f = fixture();
        seed_user(&f, 1, "marta").await;
        let listed = f.skills.get_or_create(10, "Weaving").await.unwrap();

        let profile = f
            .service
            .update_profile(
                1,
                UpdateProfileData {
                    skill_names: Some(vec!["Rust".into()]),
                    skillset_ids: Some(vec![listed.id]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let names: Vec<&str> = profile.skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Rust"]);
    }

    #[tokio::test]
    async fn update_profile_id_list_drops_unknown_ids() {
        let f = fixture();
        seed_user(&f, 1, "marta").await;
        let known = f.skills.get_or_create(10, "Rust").await.unwrap();

        let profile = f
            .service
            .update_profile(
                1,
                UpdateProfileData {
                    skillset_ids: Some(vec![known.id, 99999]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(profile.skills.len(), 1);
        assert_eq!(profile.skills[0].name, "Rust");
    }
}
