//! Infrastructure Layer
//!
//! Adapters for everything outside the process boundary:
//! PostgreSQL repositories, the Redis event bus and its in-process
//! fan-out, image storage on the local filesystem, and Prometheus
//! metrics.

pub mod database;
pub mod events;
pub mod media;
pub mod metrics;
pub mod repositories;
