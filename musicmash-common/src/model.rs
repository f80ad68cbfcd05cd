//! Domain model shared by the service and its clients
//!
//! Field names follow the wire shapes: tracks mirror the Spotify track
//! object, nodes and edges mirror what the canvas library serializes, so a
//! stored or exported snapshot loads straight back into the editor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Id of the anchor node every workflow contains
pub const MAIN_NODE_ID: &str = "main";

/// Label shown on the anchor node
pub const MAIN_NODE_LABEL: &str = "Main Node";

/// Where the anchor node sits in a fresh workflow
pub const MAIN_NODE_POSITION: Position = Position { x: 400.0, y: 100.0 };

/// Prefix of every track node id
pub const TRACK_NODE_PREFIX: &str = "track-";

/// A track as returned by the provider's top-tracks resource
///
/// Unknown provider fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<Artist>,
    pub album: Album,
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalUrls {
    pub spotify: String,
}

impl Track {
    /// Artist names joined for display ("A, B")
    pub fn artist_line(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// First album image, if any
    pub fn cover_url(&self) -> Option<&str> {
        self.album.images.first().map(|i| i.url.as_str())
    }

    /// Id of the node representing this track
    pub fn node_id(&self) -> String {
        track_node_id(&self.id)
    }
}

/// Node id derived from a track id
pub fn track_node_id(track_id: &str) -> String {
    format!("{}{}", TRACK_NODE_PREFIX, track_id)
}

/// Canvas coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Node variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "mainNode")]
    Main,
    #[serde(rename = "trackNode")]
    Track,
}

/// Node payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<Track>,
}

/// A positioned element on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub position: Position,
    pub data: NodeData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletable: Option<bool>,
}

impl Node {
    /// The anchor node in its initial position
    pub fn main() -> Self {
        Self {
            id: MAIN_NODE_ID.to_string(),
            kind: NodeKind::Main,
            position: MAIN_NODE_POSITION,
            data: NodeData {
                label: MAIN_NODE_LABEL.to_string(),
                track: None,
            },
            deletable: Some(false),
        }
    }

    /// A node carrying `track` at `position`
    pub fn track(track: Track, position: Position) -> Self {
        Self {
            id: track.node_id(),
            kind: NodeKind::Track,
            position,
            data: NodeData {
                label: track.name.clone(),
                track: Some(track),
            },
            deletable: None,
        }
    }

    pub fn is_main(&self) -> bool {
        self.id == MAIN_NODE_ID
    }

    /// Nodes are deletable unless they opt out
    pub fn is_deletable(&self) -> bool {
        !self.is_main() && self.deletable.unwrap_or(true)
    }
}

/// Directed connection between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

/// The persisted and exported unit: the whole graph at a point in time
///
/// Stored snapshots omit the timestamp; exports carry one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl WorkflowSnapshot {
    /// Same nodes and edges, stamped with `at`
    pub fn stamped(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }
}
