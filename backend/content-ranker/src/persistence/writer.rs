use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::SnapshotStore;
use crate::metrics;
use crate::models::MetricsSnapshot;

#[derive(Debug)]
enum SnapshotCommand {
    Append(MetricsSnapshot),
    Clear,
}

/// Fire-and-forget handle to the background persistence task
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    tx: mpsc::UnboundedSender<SnapshotCommand>,
}

impl SnapshotWriter {
    /// Start the background task. It exits once every writer handle is dropped.
    pub fn spawn(store: Arc<dyn SnapshotStore>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(store, rx));
        (Self { tx }, handle)
    }

    pub fn append(&self, snapshot: MetricsSnapshot) {
        self.send(SnapshotCommand::Append(snapshot));
    }

    pub fn clear(&self) {
        self.send(SnapshotCommand::Clear);
    }

    fn send(&self, command: SnapshotCommand) {
        if self.tx.send(command).is_err() {
            metrics::record_snapshot_failure("writer_closed");
            warn!("Snapshot writer stopped, dropping persistence command");
        }
    }
}

async fn run(store: Arc<dyn SnapshotStore>, mut rx: mpsc::UnboundedReceiver<SnapshotCommand>) {
    while let Some(command) = rx.recv().await {
        let (operation, result) = match &command {
            SnapshotCommand::Append(snapshot) => ("append", store.append(snapshot).await),
            SnapshotCommand::Clear => ("clear", store.clear().await),
        };

        if let Err(e) = result {
            metrics::record_snapshot_failure(operation);
            error!(operation = operation, error = %e, "Failed to persist metrics snapshot");
        }
    }

    debug!("Snapshot writer drained");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RankerError, Result};
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        ops: Mutex<Vec<String>>,
        fail_appends: bool,
    }

    #[async_trait]
    impl SnapshotStore for RecordingStore {
        async fn load(&self) -> Result<Vec<MetricsSnapshot>> {
            Ok(Vec::new())
        }

        async fn append(&self, snapshot: &MetricsSnapshot) -> Result<()> {
            if self.fail_appends {
                return Err(RankerError::Persistence("disk full".to_string()));
            }
            self.ops
                .lock()
                .await
                .push(format!("append:{}", snapshot.timestamp));
            Ok(())
        }

        async fn clear(&self) -> Result<()> {
            self.ops.lock().await.push("clear".to_string());
            Ok(())
        }
    }

    fn snapshot(timestamp: f64) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp,
            total_items: 0,
            avg_engagement: 0.0,
            ctr: 0.0,
            avg_view_time: 0.0,
            top_items: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_commands_applied_in_order() {
        let store = Arc::new(RecordingStore::default());
        let (writer, handle) = SnapshotWriter::spawn(store.clone());

        writer.append(snapshot(1.0));
        writer.clear();
        writer.append(snapshot(2.0));
        drop(writer);
        handle.await.unwrap();

        assert_eq!(
            *store.ops.lock().await,
            vec!["append:1", "clear", "append:2"]
        );
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_writer() {
        let store = Arc::new(RecordingStore {
            fail_appends: true,
            ..Default::default()
        });
        let (writer, handle) = SnapshotWriter::spawn(store.clone());

        writer.append(snapshot(1.0));
        writer.clear();
        drop(writer);
        handle.await.unwrap();

        assert_eq!(*store.ops.lock().await, vec!["clear"]);
    }
}
