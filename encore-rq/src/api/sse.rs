//! Live queue event stream
//!
//! The first event is always `bootstrap` with the full snapshot; every
//! later event is `requests`, also a full snapshot. Dropping the stream
//! (client disconnect) drops the subscription, which unregisters it.

use axum::{
    extract::{Path, State},
    response::sse::{Event, Sse},
};
use encore_common::sse::{sse_response, to_sse_event};
use futures::stream::Stream;
use std::convert::Infallible;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::AppState;

/// GET /shows/:show_id/requests/events
pub async fn request_events(
    State(state): State<AppState>,
    Path(show_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let mut subscription = state.queue.subscribe(show_id).await?;
    debug!("SSE client connected to show {}", show_id);

    let stream = async_stream::stream! {
        while let Some(event) = subscription.recv().await {
            if let Some(sse_event) = to_sse_event(&*event) {
                yield Ok::<_, Infallible>(sse_event);
            }
        }
    };

    Ok(sse_response(stream, state.queue.settings().sse_keepalive))
}
