//! Server-Sent Events for workflow changes and notices

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use tracing::debug;

/// GET /api/events
///
/// Streams `WorkflowChanged`, `WorkflowSaved`, `WorkflowCleared`,
/// `TracksLoaded` and `Notice` events.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = musicmash_common::sse::create_event_sse_stream(
        &state.event_bus,
        "musicmash-server",
        state.shutdown.clone(),
    );
    debug!(subscribers = state.event_bus.subscriber_count(), "SSE client connected");
    stream
}
