//! Graph State Store
//!
//! Ordered nodes and edges of one workflow. The main node (id `"main"`) is
//! always present and can never be removed; track nodes are keyed by their
//! track id so the same track cannot be added twice.

use super::placement::Placement;
use musicmash_common::model::{
    track_node_id, Edge, Node, NodeKind, Position, Track, WorkflowSnapshot, MAIN_NODE_ID,
    MAIN_NODE_POSITION,
};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Notice shown when a track is already on the canvas
pub const DUPLICATE_TRACK_NOTICE: &str = "This track is already added to the workflow!";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("This track is already added to the workflow!")]
    DuplicateTrack(String),

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Unknown edge: {0}")]
    UnknownEdge(String),

    #[error("The main node cannot be removed")]
    MainNodeProtected,
}

/// The workflow being edited
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    placement: Placement,
}

impl WorkflowGraph {
    /// Initial state: just the main node
    pub fn new(placement: Placement) -> Self {
        Self {
            nodes: vec![Node::main()],
            edges: Vec::new(),
            placement,
        }
    }

    /// Rebuild from a stored snapshot
    ///
    /// A snapshot without a main node gets one back at the front; a stored
    /// main node is always marked non-deletable.
    pub fn from_snapshot(snapshot: WorkflowSnapshot, placement: Placement) -> Self {
        let mut nodes = snapshot.nodes;
        match nodes.iter_mut().find(|n| n.is_main()) {
            Some(main) => {
                main.kind = NodeKind::Main;
                main.deletable = Some(false);
            }
            None => {
                warn!("Stored workflow has no main node, restoring it");
                nodes.insert(0, Node::main());
            }
        }

        Self {
            nodes,
            edges: snapshot.edges,
            placement,
        }
    }

    /// Current nodes and edges, without timestamp
    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            timestamp: None,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Whether `track_id` already has a node
    pub fn has_track(&self, track_id: &str) -> bool {
        self.contains_node(&track_node_id(track_id))
    }

    pub fn track_node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Track).count()
    }

    fn main_position(&self) -> Position {
        self.node(MAIN_NODE_ID)
            .map(|n| n.position)
            .unwrap_or(MAIN_NODE_POSITION)
    }

    /// Add a node for `track` around the main node's current position
    pub fn add_track_node(&mut self, track: Track) -> Result<&Node, GraphError> {
        if self.has_track(&track.id) {
            return Err(GraphError::DuplicateTrack(track.id));
        }

        let index = self.track_node_count();
        let position = self.placement.position(self.main_position(), index);
        debug!(track_id = %track.id, index = index, "Adding track node");

        self.nodes.push(Node::track(track, position));
        Ok(&self.nodes[self.nodes.len() - 1])
    }

    /// Link two existing nodes; parallel edges and cycles are allowed
    pub fn connect(
        &mut self,
        source: &str,
        target: &str,
        source_handle: Option<String>,
        target_handle: Option<String>,
    ) -> Result<&Edge, GraphError> {
        for id in [source, target] {
            if !self.contains_node(id) {
                return Err(GraphError::UnknownNode(id.to_string()));
            }
        }

        self.edges.push(Edge {
            id: format!("edge-{}", Uuid::new_v4()),
            source: source.to_string(),
            target: target.to_string(),
            source_handle,
            target_handle,
        });
        Ok(&self.edges[self.edges.len() - 1])
    }

    pub fn move_node(&mut self, id: &str, position: Position) -> Result<(), GraphError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
        node.position = position;
        Ok(())
    }

    /// Remove a node and every edge touching it
    ///
    /// Returns the ids of the edges removed along with it.
    pub fn remove_node(&mut self, id: &str) -> Result<Vec<String>, GraphError> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
        if !self.nodes[index].is_deletable() {
            return Err(GraphError::MainNodeProtected);
        }

        self.nodes.remove(index);

        let mut detached = Vec::new();
        self.edges.retain(|e| {
            let touches = e.source == id || e.target == id;
            if touches {
                detached.push(e.id.clone());
            }
            !touches
        });
        Ok(detached)
    }

    pub fn remove_edge(&mut self, id: &str) -> Result<Edge, GraphError> {
        let index = self
            .edges
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| GraphError::UnknownEdge(id.to_string()))?;
        Ok(self.edges.remove(index))
    }

    /// Back to the initial state
    pub fn clear(&mut self) {
        self.nodes = vec![Node::main()];
        self.edges.clear();
    }

    /// Edges ending at the main node
    pub fn connected_count(&self) -> usize {
        self.edges.iter().filter(|e| e.target == MAIN_NODE_ID).count()
    }

    /// Only the main node, no edges
    pub fn is_pristine(&self) -> bool {
        self.nodes.len() == 1 && self.edges.is_empty()
    }
}
