//! # Domain Layer
//!
//! Core marketplace model: entities and the repository traits the
//! infrastructure layer implements. Nothing here depends on axum, sqlx
//! or redis, so the application services stay testable with in-memory
//! repositories.

pub mod entities;

// Re-export commonly used types
pub use entities::*;
