//! SSE Subscription Handler
//!
//! `GET /api/events?channel=chat-{id}` opens a named-event SSE stream fed
//! by the in-process hub. The endpoint authenticates inline instead of via
//! the auth middleware because EventSource clients cannot set headers and
//! send their token as a query parameter.

use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    http::header::AUTHORIZATION,
    http::HeaderMap,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::application::dto::request::EventsQuery;
use crate::infrastructure::events::StreamEvent;
use crate::infrastructure::metrics::SseSubscriberGuard;
use crate::presentation::middleware::decode_token;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Subscribe to a single event channel
pub async fn events_handler(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
    headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    validate_channel(&query.channel)?;

    // Bearer header when present, ?token= as the EventSource fallback
    let token = bearer_token(&headers)
        .or(query.token.as_deref())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;
    let auth = decode_token(&state.settings.jwt.secret, token)?;

    let rx = state.hub.subscribe(&query.channel);
    info!(user_id = auth.user_id, channel = %query.channel, "SSE subscriber connected");

    let guard = SseSubscriberGuard::new();

    Ok(Sse::new(event_stream(rx, guard)).keep_alive(KeepAlive::default()))
}

/// Channel names must be `chat-{digits}`
fn validate_channel(raw: &str) -> Result<(), AppError> {
    match raw.strip_prefix("chat-") {
        Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => Ok(()),
        _ => Err(AppError::Validation(
            "channel: must match chat-{id}".into(),
        )),
    }
}

/// Bearer token from the Authorization header, if any
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Adapt a broadcast receiver into an SSE event stream.
///
/// Lagged receivers skip forward to the live edge; the dropped events are
/// only refetch hints, so clients recover on their next fetch. The guard
/// rides along in the stream state and settles the subscriber gauge when
/// the client disconnects.
fn event_stream(
    rx: broadcast::Receiver<StreamEvent>,
    guard: SseSubscriberGuard,
) -> impl Stream<Item = Result<Event, Infallible>> {
    futures::stream::unfold((rx, guard), |(mut rx, guard)| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let sse = Event::default()
                        .event(&event.event)
                        .data(event.data.to_string());
                    return Some((Ok(sse), (rx, guard)));
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    debug!(missed, "SSE subscriber lagged, skipping ahead");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[test]
    fn channel_names_are_restricted() {
        assert!(validate_channel("chat-17").is_ok());
        assert!(validate_channel("chat-").is_err());
        assert!(validate_channel("chat-17x").is_err());
        assert!(validate_channel("user-17").is_err());
        assert!(validate_channel("").is_err());
    }

    #[test]
    fn bearer_token_requires_the_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn stream_forwards_events_and_ends_when_sender_drops() {
        let (tx, rx) = broadcast::channel(4);
        let mut stream = Box::pin(event_stream(rx, SseSubscriberGuard::new()));

        tx.send(StreamEvent::new_message()).unwrap();
        assert!(stream.next().await.is_some());

        drop(tx);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn lagged_stream_skips_to_live_events() {
        // Capacity 1: the second send overwrites the first
        let (tx, rx) = broadcast::channel(1);
        let mut stream = Box::pin(event_stream(rx, SseSubscriberGuard::new()));

        tx.send(StreamEvent::new_message()).unwrap();
        tx.send(StreamEvent::chat_update(serde_json::json!({"id": "1"})))
            .unwrap();

        // The lagged receiver recovers and yields the surviving event
        assert!(stream.next().await.is_some());
    }
}
