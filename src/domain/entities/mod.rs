//! The marketplace model, one module per table.
//!
//! [`User`] and [`Session`] cover accounts and refresh sessions,
//! [`Skill`] is the shared vocabulary, [`Offer`] the published
//! listings, and [`Chat`]/[`Message`] the negotiation channel.
//! Each module also declares the repository trait the
//! infrastructure layer implements for it.

mod chat;
mod message;
mod offer;
mod session;
mod skill;
mod user;

pub use chat::{Chat, ChatRepository};
pub use message::{Message, MessageRepository};
pub use offer::{LearningFormat, Offer, OfferFilter, OfferRepository};
pub use session::{Session, SessionRepository};
pub use skill::{Skill, SkillRepository, SkillSide};
pub use user::{User, UserRepository};
