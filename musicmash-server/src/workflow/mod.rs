//! Workflow graph and its persistence
//!
//! - `graph`: the in-memory node/edge store
//! - `placement`: where new track nodes go
//! - `store`: durable snapshots and the load-or-initial fallback
//! - `saver`: debounced writes
//! - `export`: download of the current snapshot

pub mod export;
pub mod graph;
pub mod placement;
pub mod saver;
pub mod store;

pub use graph::{GraphError, WorkflowGraph, DUPLICATE_TRACK_NOTICE};
pub use placement::Placement;
pub use saver::DebouncedSaver;
pub use store::{load_or_initial, SnapshotStore, SqliteSnapshotStore};
