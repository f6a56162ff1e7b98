//! Data Transfer Objects
//!
//! Wire shapes of the API: validated request bodies and the response
//! envelopes built from domain entities.

pub mod request;
pub mod response;
