//! HTTP Handlers
//!
//! One module per resource, mirroring the route tree.

pub mod health;
pub mod auth;
pub mod user;
pub mod skill;
pub mod offer;
pub mod chat;
pub mod message;
