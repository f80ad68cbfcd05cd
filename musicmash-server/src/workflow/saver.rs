//! Debounced snapshot writer
//!
//! Every change hands the saver the latest snapshot. The write happens only
//! once no further change has arrived for the quiet period; each new change
//! replaces the pending snapshot and restarts the timer, so at most one write
//! is ever pending. A purge goes through the same task, which keeps it
//! ordered after any write already in progress.

use super::store::SnapshotStore;
use chrono::Utc;
use musicmash_common::events::{EventBus, MusicMashEvent, NoticeLevel};
use musicmash_common::model::WorkflowSnapshot;
use musicmash_common::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info};

enum SaverMessage {
    Schedule(WorkflowSnapshot),
    Flush(oneshot::Sender<()>),
    Purge(oneshot::Sender<Result<()>>),
}

/// Handle to the saver task
#[derive(Clone)]
pub struct DebouncedSaver {
    tx: mpsc::UnboundedSender<SaverMessage>,
}

impl DebouncedSaver {
    /// Start the saver task for `workspace`
    pub fn spawn(
        store: Arc<dyn SnapshotStore>,
        workspace: String,
        delay: Duration,
        events: EventBus,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(rx, store, workspace, delay, events));
        Self { tx }
    }

    /// Queue `snapshot`, replacing any pending one and restarting the timer
    pub fn schedule(&self, snapshot: WorkflowSnapshot) {
        if self.tx.send(SaverMessage::Schedule(snapshot)).is_err() {
            error!("Workflow saver has stopped, change not persisted");
        }
    }

    /// Write the pending snapshot now, if there is one
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(SaverMessage::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Drop the pending snapshot and delete the stored one
    pub async fn purge(&self) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(SaverMessage::Purge(done_tx))
            .map_err(|_| Error::Internal("workflow saver has stopped".to_string()))?;
        done_rx
            .await
            .map_err(|_| Error::Internal("workflow saver has stopped".to_string()))?
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<SaverMessage>,
    store: Arc<dyn SnapshotStore>,
    workspace: String,
    delay: Duration,
    events: EventBus,
) {
    let mut pending: Option<WorkflowSnapshot> = None;
    let timer = sleep(delay);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            message = rx.recv() => match message {
                Some(SaverMessage::Schedule(snapshot)) => {
                    if pending.replace(snapshot).is_some() {
                        debug!("Pending workflow save superseded");
                    }
                    timer.as_mut().reset(Instant::now() + delay);
                }
                Some(SaverMessage::Flush(done)) => {
                    if let Some(snapshot) = pending.take() {
                        write(store.as_ref(), &workspace, &snapshot, &events).await;
                    }
                    let _ = done.send(());
                }
                Some(SaverMessage::Purge(done)) => {
                    if pending.take().is_some() {
                        debug!("Pending workflow save dropped by purge");
                    }
                    let _ = done.send(store.purge(&workspace).await);
                }
                None => {
                    if let Some(snapshot) = pending.take() {
                        write(store.as_ref(), &workspace, &snapshot, &events).await;
                    }
                    info!("Workflow saver stopped");
                    break;
                }
            },
            () = &mut timer, if pending.is_some() => {
                if let Some(snapshot) = pending.take() {
                    write(store.as_ref(), &workspace, &snapshot, &events).await;
                }
            }
        }
    }
}

async fn write(store: &dyn SnapshotStore, workspace: &str, snapshot: &WorkflowSnapshot, events: &EventBus) {
    match store.save(workspace, snapshot).await {
        Ok(()) => events.emit_lossy(MusicMashEvent::WorkflowSaved {
            workspace: workspace.to_string(),
            timestamp: Utc::now(),
        }),
        Err(e) => {
            error!(workspace = workspace, "Failed to save workflow: {}", e);
            events.emit_lossy(MusicMashEvent::notice(
                NoticeLevel::Error,
                format!("Failed to save workflow: {}", e),
            ));
        }
    }
}
