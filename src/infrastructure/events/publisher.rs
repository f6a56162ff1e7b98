//! Event publishing.
//!
//! Services publish [`StreamEvent`]s through the [`EventPublisher`] trait;
//! the Redis implementation PUBLISHes them so every server process (and its
//! SSE subscribers) can pick them up. Delivery is best effort: publish
//! failures are surfaced to the caller, which logs and moves on.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Wire envelope for push events.
///
/// `event` becomes the SSE event name on delivery, `data` is forwarded
/// verbatim as the SSE data payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// SSE event name (`message` or `chat`)
    pub event: String,

    /// JSON payload
    pub data: serde_json::Value,
}

impl StreamEvent {
    /// Minimal invalidation signal sent to a chat channel. Clients refetch
    /// instead of trusting pushed content.
    pub fn new_message() -> Self {
        Self {
            event: "message".into(),
            data: serde_json::json!({ "type": "new_message" }),
        }
    }

    /// Chat summary update sent to a user channel.
    pub fn chat_update(summary: serde_json::Value) -> Self {
        Self {
            event: "chat".into(),
            data: serde_json::json!({ "type": "chat_update", "data": summary }),
        }
    }
}

/// Publishing side of the event bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event to a channel.
    async fn publish(&self, channel: &str, event: &StreamEvent) -> Result<(), AppError>;
}

/// Redis-backed publisher used in production.
#[derive(Clone)]
pub struct RedisEventPublisher {
    conn: ConnectionManager,
}

impl RedisEventPublisher {
    /// Create a publisher on top of a shared connection manager.
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    async fn publish(&self, channel: &str, event: &StreamEvent) -> Result<(), AppError> {
        let payload = serde_json::to_string(event)
            .map_err(|e| AppError::Internal(format!("Failed to encode event: {}", e)))?;

        let mut conn = self.conn.clone();
        let _receivers: i64 = conn.publish(channel, payload).await?;

        crate::infrastructure::metrics::record_event_published(&event.event);

        Ok(())
    }
}
