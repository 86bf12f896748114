//! Server-Sent Events (SSE) utilities
//!
//! Shared SSE plumbing for Encore services.

use crate::events::PushEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde::Serialize;
use std::convert::Infallible;
use std::time::Duration;
use tracing::warn;

/// Convert a push event into an axum SSE event
///
/// Returns `None` (and logs) if the payload cannot be serialized.
pub fn to_sse_event<T: Serialize>(event: &PushEvent<T>) -> Option<Event> {
    match Event::default()
        .event(event.kind.as_str())
        .json_data(&event.payload)
    {
        Ok(e) => Some(e),
        Err(e) => {
            warn!("Failed to serialize {} event: {}", event.kind, e);
            None
        }
    }
}

/// Wrap an event stream in an SSE response with keep-alive comments
pub fn sse_response<S>(stream: S, keepalive: Duration) -> Sse<S>
where
    S: Stream<Item = Result<Event, Infallible>> + Send + 'static,
{
    Sse::new(stream).keep_alive(KeepAlive::new().interval(keepalive).text("keep-alive"))
}
