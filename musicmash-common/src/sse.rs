//! Server-Sent Events (SSE) utilities

use crate::events::EventBus;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Heartbeat interval for idle connections
const HEARTBEAT: Duration = Duration::from_secs(15);

/// Stream every event on `bus` to one SSE client
///
/// Opens with a `ConnectionStatus` event; each bus event is sent as JSON
/// under its `event_type()` name. A lagging client skips the missed events
/// and keeps streaming. The stream ends when `shutdown` is cancelled, so an
/// open connection never holds up graceful shutdown.
pub fn create_event_sse_stream(
    bus: &EventBus,
    service_name: &'static str,
    shutdown: CancellationToken,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} events", service_name);
    let mut rx = bus.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            let received = tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("SSE: {} shutting down, closing stream", service_name);
                    break;
                }
                received = rx.recv() => received,
            };
            match received {
                Ok(event) => {
                    let name = event.event_type().to_string();
                    match serde_json::to_string(&event) {
                        Ok(data) => yield Ok(Event::default().event(name).data(data)),
                        Err(e) => warn!("SSE: failed to encode {} event: {}", name, e),
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!("SSE: {} client lagged, skipped {} events", service_name, skipped);
                }
                Err(RecvError::Closed) => {
                    info!("SSE: {} event bus closed", service_name);
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(HEARTBEAT).text("heartbeat"))
}
