//! Event Bus Module
//!
//! Redis pub/sub plumbing for the push notification layer.
//!
//! Two channel families share the `chat-` prefix:
//! - `chat-{chat_id}` carries `message` events telling chat subscribers to
//!   refetch;
//! - `chat-{user_id}` carries `chat` events with an updated chat summary
//!   for that user.
//!
//! Because the prefix is shared, a chat id equal to a user id would
//! cross-deliver between the families. Snowflake IDs come from a single
//! generator, which keeps the two id spaces disjoint in practice, but the
//! naming scheme itself does not separate them.
//!
//! # Architecture
//!
//! ```text
//! +----------------+   PUBLISH    +-------+   PSUBSCRIBE   +----------+
//! | EventPublisher | -----------> | Redis | -------------> |  relay   |
//! +----------------+  chat-{id}   +-------+    chat-*      +----------+
//!                                                               |
//!                                                               v
//!                                                        +------------+
//!                                                        |  EventHub  |
//!                                                        +------------+
//!                                                               |
//!                                                   broadcast   v
//!                                                        SSE handlers
//! ```

pub mod hub;
pub mod publisher;

pub use hub::{run_relay_forever, EventHub};
pub use publisher::{EventPublisher, RedisEventPublisher, StreamEvent};

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

use crate::config::RedisSettings;

/// Pattern the relay subscribes to, covering both channel families.
pub const CHANNEL_PATTERN: &str = "chat-*";

/// Channel carrying `message` events for one chat.
pub fn chat_channel(chat_id: i64) -> String {
    format!("chat-{}", chat_id)
}

/// Channel carrying `chat` summary updates for one user.
pub fn user_channel(user_id: i64) -> String {
    format!("chat-{}", user_id)
}

/// Creates a Redis connection manager with automatic reconnection.
///
/// Used for publishing and health checks; pub/sub subscriptions need a
/// dedicated connection and go through [`create_client`] instead.
#[instrument(skip(settings), fields(url = %settings.url))]
pub async fn create_connection_manager(
    settings: &RedisSettings,
) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(settings.url.as_str())?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}

/// Creates a plain Redis client for the pub/sub relay task.
pub fn create_client(settings: &RedisSettings) -> Result<Client, redis::RedisError> {
    Client::open(settings.url.as_str())
}
