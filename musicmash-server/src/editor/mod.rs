//! Editor Surface
//!
//! Turns canvas gestures into graph operations. Every change schedules a
//! debounced save and is announced on the event bus; the editor itself keeps
//! no state beyond the graph.

pub mod command;
pub mod view;

pub use command::{CommandOutcome, EditorCommand};
pub use view::EditorView;

use crate::workflow::{DebouncedSaver, GraphError, WorkflowGraph, DUPLICATE_TRACK_NOTICE};
use chrono::Utc;
use musicmash_common::events::{EventBus, MusicMashEvent, NoticeLevel};
use musicmash_common::model::{Track, WorkflowSnapshot};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Clearing the workspace needs confirmation")]
    ConfirmationRequired,

    #[error(transparent)]
    Persistence(#[from] musicmash_common::Error),
}

/// The workflow being edited, with its saver
pub struct Editor {
    graph: Mutex<WorkflowGraph>,
    saver: DebouncedSaver,
    events: EventBus,
}

impl Editor {
    pub fn new(graph: WorkflowGraph, saver: DebouncedSaver, events: EventBus) -> Self {
        Self {
            graph: Mutex::new(graph),
            saver,
            events,
        }
    }

    /// Apply one gesture
    pub async fn dispatch(&self, command: EditorCommand) -> Result<CommandOutcome, EditorError> {
        let mut graph = self.graph.lock().await;
        let mut outcome = CommandOutcome::default();

        match command {
            EditorCommand::AddTrack { track } => {
                outcome.added_node = Some(self.add_track(&mut graph, track)?);
            }
            EditorCommand::Connect {
                source,
                target,
                source_handle,
                target_handle,
            } => {
                let edge = graph.connect(&source, &target, source_handle, target_handle)?;
                debug!(edge_id = %edge.id, source = %source, target = %target, "Nodes connected");
                outcome.added_edge = Some(edge.clone());
            }
            EditorCommand::MoveNode { id, position } => {
                graph.move_node(&id, position)?;
            }
            EditorCommand::DeleteSelection { nodes, edges } => {
                self.delete_selection(&mut graph, &nodes, &edges, &mut outcome);
                if outcome.removed_nodes.is_empty() && outcome.removed_edges.is_empty() {
                    return Ok(Self::summarize(&graph, outcome));
                }
            }
            EditorCommand::Clear { confirmed } => {
                if !confirmed {
                    return Err(EditorError::ConfirmationRequired);
                }
                self.saver.purge().await?;
                graph.clear();
                info!("Workspace cleared");
                self.events.emit_lossy(MusicMashEvent::WorkflowCleared {
                    timestamp: Utc::now(),
                });
                outcome.changed = true;
                self.announce(&graph);
                return Ok(Self::summarize(&graph, outcome));
            }
        }

        outcome.changed = true;
        self.saver.schedule(graph.snapshot());
        self.announce(&graph);
        Ok(Self::summarize(&graph, outcome))
    }

    fn add_track(
        &self,
        graph: &mut WorkflowGraph,
        track: Track,
    ) -> Result<musicmash_common::model::Node, EditorError> {
        match graph.add_track_node(track) {
            Ok(node) => {
                info!(node_id = %node.id, "Track added to workflow");
                Ok(node.clone())
            }
            Err(e @ GraphError::DuplicateTrack(_)) => {
                self.events.emit_lossy(MusicMashEvent::notice(
                    NoticeLevel::Warning,
                    DUPLICATE_TRACK_NOTICE,
                ));
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove what is selected; the main node and unknown ids are skipped
    fn delete_selection(
        &self,
        graph: &mut WorkflowGraph,
        nodes: &[String],
        edges: &[String],
        outcome: &mut CommandOutcome,
    ) {
        for id in nodes {
            match graph.remove_node(id) {
                Ok(detached) => {
                    outcome.removed_nodes.push(id.clone());
                    outcome.removed_edges.extend(detached);
                }
                Err(e) => debug!(node_id = %id, "Skipping node in selection: {}", e),
            }
        }
        for id in edges {
            if outcome.removed_edges.contains(id) {
                continue;
            }
            match graph.remove_edge(id) {
                Ok(edge) => outcome.removed_edges.push(edge.id),
                Err(e) => debug!(edge_id = %id, "Skipping edge in selection: {}", e),
            }
        }
    }

    fn announce(&self, graph: &WorkflowGraph) {
        self.events.emit_lossy(MusicMashEvent::WorkflowChanged {
            node_count: graph.nodes().len(),
            edge_count: graph.edges().len(),
            connected_count: graph.connected_count(),
            timestamp: Utc::now(),
        });
    }

    fn summarize(graph: &WorkflowGraph, mut outcome: CommandOutcome) -> CommandOutcome {
        outcome.node_count = graph.nodes().len();
        outcome.edge_count = graph.edges().len();
        outcome.connected_count = graph.connected_count();
        outcome
    }

    /// Render state for the canvas and side list
    pub async fn view(&self, available: &[Track]) -> EditorView {
        EditorView::build(&*self.graph.lock().await, available)
    }

    /// Current nodes and edges
    pub async fn snapshot(&self) -> WorkflowSnapshot {
        self.graph.lock().await.snapshot()
    }

    /// Write any pending change now
    pub async fn flush(&self) {
        self.saver.flush().await;
    }
}
