//! # SkillSwap Server Library
//!
//! Backend for a peer-to-peer skill exchange marketplace: people list
//! what they can teach and what they want to learn, browse each other's
//! offers, and negotiate swaps over built-in chat.
//!
//! - RESTful HTTP API for offers, chats, messages and profiles
//! - Server-sent events for real-time push notifications
//! - PostgreSQL for persistent storage
//! - Redis pub/sub for cross-process event delivery
//!
//! Layers follow Clean Architecture: the [`domain`] module holds
//! entities and repository traits, [`application`] the services and
//! DTOs, [`infrastructure`] the PostgreSQL/Redis/filesystem adapters,
//! and [`presentation`] the axum handlers, middleware and SSE stream.

pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and SSE handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
