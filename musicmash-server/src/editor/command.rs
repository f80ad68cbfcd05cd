//! Commands the canvas sends for user gestures

use musicmash_common::model::{Edge, Node, Position, Track};
use serde::{Deserialize, Serialize};

/// One user gesture, as posted to `/api/workflow/commands`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditorCommand {
    /// Track picked from the side list
    AddTrack { track: Track },

    /// Drag between two connection handles
    Connect {
        source: String,
        target: String,
        #[serde(default, rename = "sourceHandle")]
        source_handle: Option<String>,
        #[serde(default, rename = "targetHandle")]
        target_handle: Option<String>,
    },

    /// Node dropped at a new position
    MoveNode { id: String, position: Position },

    /// Delete key on the current selection
    DeleteSelection {
        #[serde(default)]
        nodes: Vec<String>,
        #[serde(default)]
        edges: Vec<String>,
    },

    /// "Clear All", after the user confirmed
    Clear {
        #[serde(default)]
        confirmed: bool,
    },
}

/// What a command did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommandOutcome {
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_node: Option<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_edge: Option<Edge>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed_nodes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed_edges: Vec<String>,
    pub node_count: usize,
    pub edge_count: usize,
    pub connected_count: usize,
}
