//! In-process event fan-out.
//!
//! The hub keeps one tokio broadcast channel per event channel name. A
//! single relay task per process PSUBSCRIBEs to the full channel pattern
//! and feeds everything it receives into the hub; SSE handlers subscribe
//! to individual channels by name.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::StreamExt;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use super::publisher::StreamEvent;
use crate::shared::error::AppError;

/// Capacity of each per-channel broadcast buffer. Subscribers that fall
/// further behind than this skip ahead, dropping the missed events.
const CHANNEL_CAPACITY: usize = 64;

/// Per-channel broadcast registry.
pub struct EventHub {
    channels: DashMap<String, broadcast::Sender<StreamEvent>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to a channel, creating it on first use.
    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<StreamEvent> {
        self.channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Deliver an event to local subscribers of a channel.
    ///
    /// Returns the number of receivers; channels that lost their last
    /// subscriber are pruned on the way out.
    pub fn publish_local(&self, channel: &str, event: StreamEvent) -> usize {
        let delivered = match self.channels.get(channel) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => return 0,
        };

        if delivered == 0 {
            self.channels
                .remove_if(channel, |_, sender| sender.receiver_count() == 0);
        }

        delivered
    }

    /// Total number of active subscriptions across all channels.
    pub fn subscriber_count(&self) -> usize {
        self.channels
            .iter()
            .map(|entry| entry.value().receiver_count())
            .sum()
    }

    /// Number of channels currently registered.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward redis pub/sub traffic into the hub until the connection drops.
async fn run_relay(client: redis::Client, hub: Arc<EventHub>) -> Result<(), AppError> {
    let mut pubsub = client.get_async_pubsub().await?;
    pubsub.psubscribe(super::CHANNEL_PATTERN).await?;
    info!(pattern = super::CHANNEL_PATTERN, "Event relay subscribed");

    let mut stream = pubsub.on_message();
    while let Some(msg) = stream.next().await {
        let channel = msg.get_channel_name().to_string();
        let payload: String = match msg.get_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(channel = %channel, error = %e, "Discarding undecodable event payload");
                continue;
            }
        };

        match serde_json::from_str::<StreamEvent>(&payload) {
            Ok(event) => {
                let delivered = hub.publish_local(&channel, event);
                debug!(channel = %channel, delivered, "Relayed event");
            }
            Err(e) => {
                warn!(channel = %channel, error = %e, "Discarding malformed event");
            }
        }
    }

    Ok(())
}

/// Keep the relay running, reconnecting with a fixed backoff when the
/// subscription stream ends or errors out.
pub async fn run_relay_forever(client: redis::Client, hub: Arc<EventHub>) {
    loop {
        match run_relay(client.clone(), hub.clone()).await {
            Ok(()) => warn!("Event relay stream ended, reconnecting"),
            Err(e) => error!(error = %e, "Event relay failed, reconnecting"),
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
