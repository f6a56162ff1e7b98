//! The business logic layer, one service per resource.
//!
//! Every service comes as a trait plus an `Impl` generic over the
//! repository traits it needs, so handler tests can swap in the
//! in-memory repositories. Each carries its own error enum; the
//! handlers translate those into HTTP responses.

pub mod auth_service;
pub mod chat_service;
pub mod message_service;
pub mod offer_service;
pub mod skill_service;
pub mod user_service;

pub use auth_service::{AuthError, AuthService, AuthServiceImpl, AuthTokens, Claims, RegisterData};
pub use chat_service::{ChatDetails, ChatError, ChatService, ChatServiceImpl};
pub use message_service::{
    MessageDetails, MessageError, MessageService, MessageServiceImpl, SendMessageData,
};
pub use offer_service::{
    CreateOfferData, OfferDetails, OfferError, OfferService, OfferServiceImpl, UpdateOfferData,
};
pub use skill_service::{SkillError, SkillService, SkillServiceImpl};
pub use user_service::{UpdateProfileData, UserError, UserProfile, UserService, UserServiceImpl};
