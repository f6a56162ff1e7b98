//! Application Layer
//!
//! Services that carry the marketplace use cases, plus the DTOs they
//! exchange with the HTTP handlers. Services depend only on the domain
//! repository traits, never on sqlx or axum directly.

pub mod services;
pub mod dto;
