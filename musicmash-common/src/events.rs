//! Event types and the broadcast event bus
//!
//! The editor emits events whenever the workflow changes or the user needs
//! to see a notice; `/api/events` relays them to browsers over SSE.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Severity of a user-visible notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Events broadcast to connected clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MusicMashEvent {
    /// Nodes or edges changed
    WorkflowChanged {
        node_count: usize,
        edge_count: usize,
        connected_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A debounced save reached storage
    WorkflowSaved {
        workspace: String,
        timestamp: DateTime<Utc>,
    },

    /// The workspace was reset and its stored snapshot purged
    WorkflowCleared { timestamp: DateTime<Utc> },

    /// A fresh top-tracks list was applied
    TracksLoaded {
        count: usize,
        sequence: u64,
        timestamp: DateTime<Utc>,
    },

    /// Something the user should be told about
    Notice {
        level: NoticeLevel,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl MusicMashEvent {
    /// SSE event name
    pub fn event_type(&self) -> &str {
        match self {
            MusicMashEvent::WorkflowChanged { .. } => "WorkflowChanged",
            MusicMashEvent::WorkflowSaved { .. } => "WorkflowSaved",
            MusicMashEvent::WorkflowCleared { .. } => "WorkflowCleared",
            MusicMashEvent::TracksLoaded { .. } => "TracksLoaded",
            MusicMashEvent::Notice { .. } => "Notice",
        }
    }

    /// Convenience constructor for notices stamped now
    pub fn notice(level: NoticeLevel, message: impl Into<String>) -> Self {
        MusicMashEvent::Notice {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Broadcast bus fanning events out to every subscriber
///
/// Cloning is cheap; all clones share one channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MusicMashEvent>,
}

impl EventBus {
    /// Creates a new EventBus buffering `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<MusicMashEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: MusicMashEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
