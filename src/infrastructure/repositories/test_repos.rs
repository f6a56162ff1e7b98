//! In-memory repository fakes for application-layer tests.
//!
//! Each fake mirrors the observable behavior of its Postgres counterpart:
//! the same uniqueness conflicts, the same not-found errors, the same
//! listing order and the same silent skipping of unknown IDs. Foreign-key
//! cascades between fakes are not modeled.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::domain::entities::{
    Chat, ChatRepository, Message, MessageRepository, Offer, OfferFilter, OfferRepository,
    Session, SessionRepository, Skill, SkillRepository, SkillSide, User, UserRepository,
};
use crate::infrastructure::events::{EventPublisher, StreamEvent};
use crate::shared::error::AppError;

// ==========================================================================
// Users
// ==========================================================================

#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<HashMap<i64, User>>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_many(&self, ids: &[i64]) -> Result<Vec<User>, AppError> {
        let users = self.users.lock();
        let mut found: Vec<User> = ids.iter().filter_map(|id| users.get(id).cloned()).collect();
        found.sort_by_key(|u| u.id);
        found.dedup_by_key(|u| u.id);
        Ok(found)
    }

    async fn existing_ids(&self, ids: &[i64]) -> Result<Vec<i64>, AppError> {
        let users = self.users.lock();
        let mut found: Vec<i64> = ids
            .iter()
            .copied()
            .filter(|id| users.contains_key(id))
            .collect();
        found.sort_unstable();
        found.dedup();
        Ok(found)
    }

    async fn create(&self, user: &User) -> Result<User, AppError> {
        let mut users = self.users.lock();
        let taken = users.values().any(|u| {
            u.username == user.username
                || (user.email.is_some() && u.email == user.email)
        });
        if taken {
            return Err(AppError::Conflict(
                "Username or email already in use".to_string(),
            ));
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn update(&self, user: &User) -> Result<User, AppError> {
        let mut users = self.users.lock();
        if user.email.is_some() {
            let email_taken = users
                .values()
                .any(|u| u.id != user.id && u.email == user.email);
            if email_taken {
                return Err(AppError::Conflict(
                    "Email is already in use".to_string(),
                ));
            }
        }
        let existing = users
            .get(&user.id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.id)))?;

        // Same columns the SQL UPDATE touches: username, password_hash and
        // created_at stay as stored.
        let updated = User {
            id: existing.id,
            username: existing.username,
            email: user.email.clone(),
            password_hash: existing.password_hash,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            photo_path: user.photo_path.clone(),
            avatar_seed: user.avatar_seed.clone(),
            is_active: user.is_active,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };
        users.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        Ok(self.users.lock().values().any(|u| u.username == username))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        Ok(self
            .users
            .lock()
            .values()
            .any(|u| u.email.as_deref() == Some(email)))
    }
}

// ==========================================================================
// Skills
// ==========================================================================

#[derive(Default)]
pub struct MemorySkillRepository {
    skills: Mutex<HashMap<i64, Skill>>,
    user_skills: Mutex<HashMap<i64, Vec<i64>>>,
    offer_learn: Mutex<HashMap<i64, Vec<i64>>>,
    offer_teach: Mutex<HashMap<i64, Vec<i64>>>,
}

impl MemorySkillRepository {
    fn side_links(&self, side: SkillSide) -> &Mutex<HashMap<i64, Vec<i64>>> {
        match side {
            SkillSide::Learn => &self.offer_learn,
            SkillSide::Teach => &self.offer_teach,
        }
    }

    /// Drop unknown IDs and duplicates, as the join-based inserts do.
    fn known_ids(&self, ids: &[i64]) -> Vec<i64> {
        let skills = self.skills.lock();
        let mut kept = Vec::new();
        for id in ids {
            if skills.contains_key(id) && !kept.contains(id) {
                kept.push(*id);
            }
        }
        kept
    }
}

#[async_trait]
impl SkillRepository for MemorySkillRepository {
    async fn list_all(&self) -> Result<Vec<Skill>, AppError> {
        let mut all: Vec<Skill> = self.skills.lock().values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Skill>, AppError> {
        let skills = self.skills.lock();
        let mut found: Vec<Skill> = ids.iter().filter_map(|id| skills.get(id).cloned()).collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found.dedup();
        Ok(found)
    }

    async fn get_or_create(&self, new_id: i64, name: &str) -> Result<Skill, AppError> {
        let mut skills = self.skills.lock();
        if let Some(existing) = skills.values().find(|s| s.name == name) {
            return Ok(existing.clone());
        }
        let skill = Skill::new(new_id, name);
        skills.insert(new_id, skill.clone());
        Ok(skill)
    }

    async fn for_user(&self, user_id: i64) -> Result<Vec<Skill>, AppError> {
        let linked = self
            .user_skills
            .lock()
            .get(&user_id)
            .cloned()
            .unwrap_or_default();
        self.find_by_ids(&linked).await
    }

    async fn set_for_user(&self, user_id: i64, skill_ids: &[i64]) -> Result<(), AppError> {
        let kept = self.known_ids(skill_ids);
        self.user_skills.lock().insert(user_id, kept);
        Ok(())
    }

    async fn for_offers(
        &self,
        offer_ids: &[i64],
        side: SkillSide,
    ) -> Result<Vec<(i64, Skill)>, AppError> {
        let links = self.side_links(side).lock();
        let skills = self.skills.lock();
        let mut pairs = Vec::new();
        for offer_id in offer_ids {
            for skill_id in links.get(offer_id).map(Vec::as_slice).unwrap_or(&[]) {
                if let Some(skill) = skills.get(skill_id) {
                    pairs.push((*offer_id, skill.clone()));
                }
            }
        }
        pairs.sort_by(|a, b| a.1.name.cmp(&b.1.name).then(a.0.cmp(&b.0)));
        Ok(pairs)
    }

    async fn replace_for_offer(
        &self,
        offer_id: i64,
        side: SkillSide,
        skill_ids: &[i64],
    ) -> Result<(), AppError> {
        let kept = self.known_ids(skill_ids);
        self.side_links(side).lock().insert(offer_id, kept);
        Ok(())
    }

    async fn add_for_offer(
        &self,
        offer_id: i64,
        side: SkillSide,
        skill_ids: &[i64],
    ) -> Result<(), AppError> {
        let kept = self.known_ids(skill_ids);
        let mut links = self.side_links(side).lock();
        let entry = links.entry(offer_id).or_default();
        for id in kept {
            if !entry.contains(&id) {
                entry.push(id);
            }
        }
        Ok(())
    }
}

// ==========================================================================
// Offers
// ==========================================================================

pub struct MemoryOfferRepository {
    offers: Mutex<HashMap<i64, Offer>>,
    /// Shared with the service under test so the skill filter sees the
    /// same associations.
    skills: Arc<MemorySkillRepository>,
}

impl MemoryOfferRepository {
    pub fn new(skills: Arc<MemorySkillRepository>) -> Self {
        Self {
            offers: Mutex::new(HashMap::new()),
            skills,
        }
    }
}

#[async_trait]
impl OfferRepository for MemoryOfferRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Offer>, AppError> {
        Ok(self.offers.lock().get(&id).cloned())
    }

    async fn list_active(&self, filter: &OfferFilter) -> Result<Vec<Offer>, AppError> {
        let mut active: Vec<Offer> = self
            .offers
            .lock()
            .values()
            .filter(|o| o.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let mut matching = Vec::new();
        for offer in active {
            if let Some(names) = &filter.skills {
                let learn = self.skills.for_offers(&[offer.id], SkillSide::Learn).await?;
                let teach = self.skills.for_offers(&[offer.id], SkillSide::Teach).await?;
                let hit = learn
                    .iter()
                    .chain(teach.iter())
                    .any(|(_, skill)| names.contains(&skill.name));
                if !hit {
                    continue;
                }
            }
            if let Some(term) = &filter.search {
                let needle = term.to_lowercase();
                if !offer.title.to_lowercase().contains(&needle)
                    && !offer.description.to_lowercase().contains(&needle)
                {
                    continue;
                }
            }
            matching.push(offer);
        }
        Ok(matching)
    }

    async fn create(&self, offer: &Offer) -> Result<Offer, AppError> {
        self.offers.lock().insert(offer.id, offer.clone());
        Ok(offer.clone())
    }

    async fn update(&self, offer: &Offer) -> Result<Offer, AppError> {
        let mut offers = self.offers.lock();
        let existing = offers
            .get(&offer.id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Offer with id {} not found", offer.id)))?;

        let updated = Offer {
            created_at: existing.created_at,
            user_id: existing.user_id,
            updated_at: Utc::now(),
            ..offer.clone()
        };
        offers.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn deactivate(&self, id: i64) -> Result<(), AppError> {
        let mut offers = self.offers.lock();
        let offer = offers
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Offer with id {} not found", id)))?;
        offer.is_active = false;
        offer.updated_at = Utc::now();
        Ok(())
    }
}

// ==========================================================================
// Chats
// ==========================================================================

#[derive(Default)]
pub struct MemoryChatRepository {
    chats: Mutex<HashMap<i64, Chat>>,
    participants: Mutex<HashMap<i64, Vec<i64>>>,
}

#[async_trait]
impl ChatRepository for MemoryChatRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Chat>, AppError> {
        Ok(self.chats.lock().get(&id).cloned())
    }

    async fn create(&self, chat: &Chat, participant_ids: &[i64]) -> Result<Chat, AppError> {
        self.chats.lock().insert(chat.id, chat.clone());
        let mut ids: Vec<i64> = participant_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        self.participants.lock().insert(chat.id, ids);
        Ok(chat.clone())
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Chat>, AppError> {
        let participants = self.participants.lock();
        let chats = self.chats.lock();
        let mut joined: Vec<Chat> = chats
            .values()
            .filter(|c| {
                participants
                    .get(&c.id)
                    .is_some_and(|ids| ids.contains(&user_id))
            })
            .cloned()
            .collect();
        joined.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(joined)
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        if self.chats.lock().remove(&id).is_none() {
            return Err(AppError::NotFound(format!("Chat with id {} not found", id)));
        }
        self.participants.lock().remove(&id);
        Ok(())
    }

    async fn is_participant(&self, chat_id: i64, user_id: i64) -> Result<bool, AppError> {
        Ok(self
            .participants
            .lock()
            .get(&chat_id)
            .is_some_and(|ids| ids.contains(&user_id)))
    }

    async fn participant_ids(&self, chat_id: i64) -> Result<Vec<i64>, AppError> {
        Ok(self
            .participants
            .lock()
            .get(&chat_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn touch(&self, chat_id: i64, at: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(chat) = self.chats.lock().get_mut(&chat_id) {
            chat.updated_at = at;
        }
        Ok(())
    }
}

// ==========================================================================
// Messages
// ==========================================================================

#[derive(Default)]
pub struct MemoryMessageRepository {
    messages: Mutex<HashMap<i64, Message>>,
}

#[async_trait]
impl MessageRepository for MemoryMessageRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, AppError> {
        Ok(self.messages.lock().get(&id).cloned())
    }

    async fn create(&self, message: &Message) -> Result<Message, AppError> {
        self.messages.lock().insert(message.id, message.clone());
        Ok(message.clone())
    }

    async fn list_for_chat(&self, chat_id: i64) -> Result<Vec<Message>, AppError> {
        let mut in_chat: Vec<Message> = self
            .messages
            .lock()
            .values()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect();
        in_chat.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(in_chat)
    }

    async fn last_for_chat(&self, chat_id: i64) -> Result<Option<Message>, AppError> {
        let in_chat = self.list_for_chat(chat_id).await?;
        Ok(in_chat.last().cloned())
    }

    async fn unread_count(&self, chat_id: i64, viewer_id: i64) -> Result<i64, AppError> {
        Ok(self
            .messages
            .lock()
            .values()
            .filter(|m| m.chat_id == chat_id && !m.is_read && m.sender_id != viewer_id)
            .count() as i64)
    }

    async fn mark_read(&self, message_id: i64) -> Result<(), AppError> {
        let mut messages = self.messages.lock();
        let message = messages.get_mut(&message_id).ok_or_else(|| {
            AppError::NotFound(format!("Message with id {} not found", message_id))
        })?;
        message.is_read = true;
        Ok(())
    }
}

// ==========================================================================
// Sessions
// ==========================================================================

#[derive(Default)]
pub struct MemorySessionRepository {
    sessions: Mutex<HashMap<Uuid, Session>>,
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn create(&self, session: &Session) -> Result<Session, AppError> {
        self.sessions.lock().insert(session.id, session.clone());
        Ok(session.clone())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Session>, AppError> {
        Ok(self
            .sessions
            .lock()
            .values()
            .find(|s| s.refresh_token_hash == token_hash && s.revoked_at.is_none())
            .cloned())
    }

    async fn revoke(&self, id: Uuid) -> Result<(), AppError> {
        let mut sessions = self.sessions.lock();
        match sessions.get_mut(&id) {
            Some(session) if session.revoked_at.is_none() => {
                session.revoked_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(AppError::NotFound(format!("Session {} not found", id))),
        }
    }

    async fn revoke_all_for_user(&self, user_id: i64) -> Result<u64, AppError> {
        let mut sessions = self.sessions.lock();
        let mut revoked = 0;
        for session in sessions.values_mut() {
            if session.user_id == user_id && session.revoked_at.is_none() {
                session.revoked_at = Some(Utc::now());
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn delete_expired(&self) -> Result<u64, AppError> {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}

// ==========================================================================
// Event publisher
// ==========================================================================

/// Records published events instead of hitting Redis. Can be switched into
/// a failing mode to exercise publish-error handling.
#[derive(Default)]
pub struct MemoryEventPublisher {
    published: Mutex<Vec<(String, StreamEvent)>>,
    failing: AtomicBool,
}

impl MemoryEventPublisher {
    pub fn published(&self) -> Vec<(String, StreamEvent)> {
        self.published.lock().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventPublisher for MemoryEventPublisher {
    async fn publish(&self, channel: &str, event: &StreamEvent) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Internal("event bus unavailable".to_string()));
        }
        self.published
            .lock()
            .push((channel.to_string(), event.clone()));
        Ok(())
    }
}
