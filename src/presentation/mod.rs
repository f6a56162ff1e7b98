//! Presentation Layer
//!
//! HTTP routes, middleware and the SSE event stream.

pub mod http;
pub mod middleware;
pub mod sse;
