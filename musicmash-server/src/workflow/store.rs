//! Durable snapshot storage
//!
//! One snapshot per workspace key, overwritten on every save. Loading never
//! fails the caller: a missing, unreadable or unparsable snapshot degrades to
//! the initial single-node workflow with a warning.

use super::graph::WorkflowGraph;
use super::placement::Placement;
use async_trait::async_trait;
use chrono::Utc;
use musicmash_common::model::WorkflowSnapshot;
use musicmash_common::Result;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

/// Where snapshots live
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Stored snapshot for `workspace`; `Ok(None)` if there is none
    async fn load(&self, workspace: &str) -> Result<Option<WorkflowSnapshot>>;

    /// Replace the stored snapshot for `workspace`
    async fn save(&self, workspace: &str, snapshot: &WorkflowSnapshot) -> Result<()>;

    /// Delete the stored snapshot for `workspace`
    async fn purge(&self, workspace: &str) -> Result<()>;
}

/// Snapshots in the `workflow_snapshots` table
#[derive(Clone)]
pub struct SqliteSnapshotStore {
    db: SqlitePool,
}

impl SqliteSnapshotStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn load(&self, workspace: &str) -> Result<Option<WorkflowSnapshot>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT snapshot FROM workflow_snapshots WHERE workspace = ?")
                .bind(workspace)
                .fetch_optional(&self.db)
                .await?;

        match row {
            Some((json,)) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, workspace: &str, snapshot: &WorkflowSnapshot) -> Result<()> {
        // The stored form carries nodes and edges only
        let stored = WorkflowSnapshot {
            timestamp: None,
            ..snapshot.clone()
        };
        let json = serde_json::to_string(&stored)?;

        sqlx::query(
            r#"
            INSERT INTO workflow_snapshots (workspace, snapshot, saved_at)
            VALUES (?, ?, ?)
            ON CONFLICT(workspace) DO UPDATE SET
                snapshot = excluded.snapshot,
                saved_at = excluded.saved_at
            "#,
        )
        .bind(workspace)
        .bind(json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.db)
        .await?;

        debug!(
            workspace = workspace,
            nodes = stored.nodes.len(),
            edges = stored.edges.len(),
            "Workflow snapshot saved"
        );
        Ok(())
    }

    async fn purge(&self, workspace: &str) -> Result<()> {
        sqlx::query("DELETE FROM workflow_snapshots WHERE workspace = ?")
            .bind(workspace)
            .execute(&self.db)
            .await?;
        debug!(workspace = workspace, "Workflow snapshot purged");
        Ok(())
    }
}

/// The stored workflow for `workspace`, or the initial one
pub async fn load_or_initial(
    store: &dyn SnapshotStore,
    workspace: &str,
    placement: Placement,
) -> WorkflowGraph {
    match store.load(workspace).await {
        Ok(Some(snapshot)) => {
            info!(
                workspace = workspace,
                nodes = snapshot.nodes.len(),
                edges = snapshot.edges.len(),
                "Loaded saved workflow"
            );
            WorkflowGraph::from_snapshot(snapshot, placement)
        }
        Ok(None) => {
            info!(workspace = workspace, "No saved workflow, starting fresh");
            WorkflowGraph::new(placement)
        }
        Err(e) => {
            warn!(workspace = workspace, "Failed to load saved workflow: {}", e);
            WorkflowGraph::new(placement)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::graph::tests::track;
    use musicmash_common::db::init_memory_database;
    use musicmash_common::model::MAIN_NODE_ID;

    async fn store() -> SqliteSnapshotStore {
        SqliteSnapshotStore::new(init_memory_database().await.unwrap())
    }

    fn sample_graph() -> WorkflowGraph {
        let mut graph = WorkflowGraph::new(Placement::Ring);
        graph.add_track_node(track("a")).unwrap();
        graph.add_track_node(track("b")).unwrap();
        graph.connect("track-a", MAIN_NODE_ID, None, None).unwrap();
        graph
    }

    #[tokio::test]
    async fn test_save_then_load_reproduces_graph() {
        let store = store().await;
        let graph = sample_graph();
        store.save("ws", &graph.snapshot()).await.unwrap();

        let loaded = load_or_initial(&store, "ws", Placement::Ring).await;
        assert_eq!(loaded.nodes(), graph.nodes());
        assert_eq!(loaded.edges(), graph.edges());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_snapshot() {
        let store = store().await;
        store.save("ws", &sample_graph().snapshot()).await.unwrap();
        store
            .save("ws", &WorkflowGraph::new(Placement::Ring).snapshot())
            .await
            .unwrap();

        let loaded = store.load("ws").await.unwrap().unwrap();
        assert_eq!(loaded.nodes.len(), 1);
        assert!(loaded.edges.is_empty());
    }

    #[tokio::test]
    async fn test_stored_form_has_no_timestamp() {
        let store = store().await;
        let stamped = sample_graph().snapshot().stamped(Utc::now());
        store.save("ws", &stamped).await.unwrap();

        let loaded = store.load("ws").await.unwrap().unwrap();
        assert!(loaded.timestamp.is_none());
    }

    #[tokio::test]
    async fn test_workspaces_are_independent() {
        let store = store().await;
        store.save("one", &sample_graph().snapshot()).await.unwrap();
        assert!(store.load("two").await.unwrap().is_none());

        store.purge("one").await.unwrap();
        assert!(store.load("one").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_snapshot_falls_back_to_initial() {
        let store = store().await;
        let graph = load_or_initial(&store, "ws", Placement::Ring).await;
        assert!(graph.is_pristine());
    }

    #[tokio::test]
    async fn test_unparsable_snapshot_falls_back_to_initial() {
        let store = store().await;
        sqlx::query("INSERT INTO workflow_snapshots (workspace, snapshot, saved_at) VALUES (?, ?, ?)")
            .bind("ws")
            .bind("{not json")
            .bind(Utc::now().to_rfc3339())
            .execute(&store.db)
            .await
            .unwrap();

        assert!(store.load("ws").await.is_err());
        let graph = load_or_initial(&store, "ws", Placement::Ring).await;
        assert!(graph.is_pristine());
    }

    #[tokio::test]
    async fn test_snapshot_with_missing_sections_loads() {
        let store = store().await;
        sqlx::query("INSERT INTO workflow_snapshots (workspace, snapshot, saved_at) VALUES (?, ?, ?)")
            .bind("ws")
            .bind("{}")
            .bind(Utc::now().to_rfc3339())
            .execute(&store.db)
            .await
            .unwrap();

        let graph = load_or_initial(&store, "ws", Placement::Ring).await;
        assert!(graph.is_pristine());
    }
}
