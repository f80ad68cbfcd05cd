//! What the canvas and side list show
//!
//! Built from the graph plus the session's available tracks. The browser
//! draws this as-is; it holds no state of its own.

use crate::workflow::WorkflowGraph;
use musicmash_common::model::{Edge, Node, NodeKind, Position, Track};
use serde::Serialize;

const MAIN_NODE_CAPTION: &str = "Connect here to start";
const MAIN_MINIMAP_COLOR: &str = "#10b981";
const TRACK_MINIMAP_COLOR: &str = "#f3f4f6";

/// Tips shown on an empty canvas
pub const GETTING_STARTED_TIPS: [&str; 4] = [
    "Click tracks from the sidebar to add them",
    "Drag connection handles to link tracks",
    "Use mouse wheel to zoom",
    "Press Delete to remove selected items",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleKind {
    Source,
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleSide {
    Left,
    Right,
}

/// A connection point on a node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandleView {
    pub kind: HandleKind,
    pub side: HandleSide,
}

/// A node as drawn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub position: Position,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub handles: Vec<HandleView>,
    pub deletable: bool,
    pub minimap_color: &'static str,
}

impl NodeView {
    fn from_node(node: &Node) -> Self {
        match node.kind {
            NodeKind::Main => Self {
                id: node.id.clone(),
                kind: node.kind,
                position: node.position,
                title: node.data.label.clone(),
                subtitle: Some(MAIN_NODE_CAPTION.to_string()),
                image_url: None,
                handles: vec![HandleView {
                    kind: HandleKind::Target,
                    side: HandleSide::Left,
                }],
                deletable: false,
                minimap_color: MAIN_MINIMAP_COLOR,
            },
            NodeKind::Track => {
                let track = node.data.track.as_ref();
                Self {
                    id: node.id.clone(),
                    kind: node.kind,
                    position: node.position,
                    title: track
                        .map(|t| t.name.clone())
                        .unwrap_or_else(|| node.data.label.clone()),
                    subtitle: track.map(Track::artist_line),
                    image_url: track.and_then(Track::cover_url).map(str::to_string),
                    handles: vec![
                        HandleView {
                            kind: HandleKind::Source,
                            side: HandleSide::Right,
                        },
                        HandleView {
                            kind: HandleKind::Target,
                            side: HandleSide::Left,
                        },
                    ],
                    deletable: node.is_deletable(),
                    minimap_color: TRACK_MINIMAP_COLOR,
                }
            }
        }
    }
}

/// One entry of the side list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SidebarTrack {
    /// 1-based position in the top-tracks list
    pub rank: usize,
    pub id: String,
    pub name: String,
    pub artists: String,
    pub album: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub external_url: String,
    pub added: bool,
}

/// Side list with its counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sidebar {
    pub available: usize,
    pub connected: usize,
    pub tracks: Vec<SidebarTrack>,
}

/// Everything the editor page renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorView {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<Edge>,
    pub sidebar: Sidebar,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub getting_started: Vec<&'static str>,
}

impl EditorView {
    pub fn build(graph: &WorkflowGraph, available: &[Track]) -> Self {
        let tracks = available
            .iter()
            .enumerate()
            .map(|(index, track)| SidebarTrack {
                rank: index + 1,
                id: track.id.clone(),
                name: track.name.clone(),
                artists: track.artist_line(),
                album: track.album.name.clone(),
                image_url: track.cover_url().map(str::to_string),
                external_url: track.external_urls.spotify.clone(),
                added: graph.has_track(&track.id),
            })
            .collect();

        Self {
            nodes: graph.nodes().iter().map(NodeView::from_node).collect(),
            edges: graph.edges().to_vec(),
            sidebar: Sidebar {
                available: available.len(),
                connected: graph.connected_count(),
                tracks,
            },
            getting_started: if graph.is_pristine() {
                GETTING_STARTED_TIPS.to_vec()
            } else {
                Vec::new()
            },
        }
    }
}
