//! Shared Utilities
//!
//! Error type, id generation and input validation helpers used by
//! every layer.

pub mod error;
pub mod snowflake;
pub mod validation;
