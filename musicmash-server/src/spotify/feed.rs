//! Latest top-tracks list with a stale-response guard
//!
//! Every fetch draws a ticket before it goes out. When results come back
//! they are applied only if their ticket is newer than the last applied one,
//! so a slow response can never overwrite a fresher list.

use musicmash_common::model::Track;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct Applied {
    sequence: u64,
    tracks: Vec<Track>,
}

/// One session's available tracks
#[derive(Default)]
pub struct TrackFeed {
    next_ticket: AtomicU64,
    applied: RwLock<Applied>,
}

impl TrackFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the ticket for a fetch about to start (1, 2, 3, ...)
    pub fn ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply `tracks` fetched under `ticket`; false if a newer list already landed
    pub async fn apply(&self, ticket: u64, tracks: Vec<Track>) -> bool {
        let mut applied = self.applied.write().await;
        if ticket <= applied.sequence {
            debug!(
                ticket = ticket,
                applied = applied.sequence,
                "Discarding stale top-tracks response"
            );
            return false;
        }
        applied.sequence = ticket;
        applied.tracks = tracks;
        true
    }

    /// Current list (empty until a fetch succeeds)
    pub async fn tracks(&self) -> Vec<Track> {
        self.applied.read().await.tracks.clone()
    }

    /// Ticket of the list currently applied (0 = none yet)
    pub async fn applied_sequence(&self) -> u64 {
        self.applied.read().await.sequence
    }
}
