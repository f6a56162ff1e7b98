//! Server-Sent Events
//!
//! Push delivery for the event bus (see `infrastructure::events`).

pub mod handler;

pub use handler::events_handler;
