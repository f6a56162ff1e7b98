//! Repository Implementations
//!
//! Concrete PostgreSQL repositories for the traits the domain layer
//! defines, one per aggregate:
//!
//! - **UserRepository** - accounts and profile updates
//! - **SkillRepository** - skill vocabulary and both kinds of associations
//! - **OfferRepository** - marketplace listings with soft delete
//! - **ChatRepository** - conversations and their participants
//! - **MessageRepository** - messages and read state
//! - **SessionRepository** - refresh token sessions
//!
//! Services receive these as `Arc<PgXxxRepository>`, constructed per
//! request from the shared pool in the handlers.

pub mod chat_repository;
pub mod message_repository;
pub mod offer_repository;
pub mod session_repository;
pub mod skill_repository;
pub mod user_repository;

#[cfg(test)]
pub mod test_repos;

// Re-export repository structs for convenience
pub use chat_repository::PgChatRepository;
pub use message_repository::PgMessageRepository;
pub use offer_repository::PgOfferRepository;
pub use session_repository::PgSessionRepository;
pub use skill_repository::PgSkillRepository;
pub use user_repository::PgUserRepository;
