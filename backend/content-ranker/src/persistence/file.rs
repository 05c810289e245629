use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::SnapshotStore;
use crate::error::Result;
use crate::models::MetricsSnapshot;

/// Append-only JSON-lines file, one snapshot per line
#[derive(Debug, Clone)]
pub struct JsonLinesSnapshotStore {
    path: PathBuf,
}

impl JsonLinesSnapshotStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl SnapshotStore for JsonLinesSnapshotStore {
    async fn load(&self) -> Result<Vec<MetricsSnapshot>> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut snapshots = Vec::new();
        for (line_no, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<MetricsSnapshot>(line) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => warn!(
                    path = %self.path.display(),
                    line = line_no + 1,
                    error = %e,
                    "Skipping unreadable snapshot record"
                ),
            }
        }

        debug!(
            path = %self.path.display(),
            count = snapshots.len(),
            "Loaded snapshot history"
        );

        Ok(snapshots)
    }

    async fn append(&self, snapshot: &MetricsSnapshot) -> Result<()> {
        let mut line = serde_json::to_string(snapshot)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        fs::write(&self.path, b"").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(timestamp: f64) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp,
            total_items: 1,
            avg_engagement: 0.5,
            ctr: 0.25,
            avg_view_time: 2.0,
            top_items: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonLinesSnapshotStore::new(dir.path().join("absent.jsonl"));

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_load_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonLinesSnapshotStore::new(dir.path().join("history.jsonl"));

        store.append(&snapshot(1.0)).await.unwrap();
        store.append(&snapshot(2.0)).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, vec![snapshot(1.0), snapshot(2.0)]);

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let good = serde_json::to_string(&snapshot(3.0)).unwrap();
        tokio::fs::write(&path, format!("not json\n{}\n\n", good))
            .await
            .unwrap();

        let loaded = JsonLinesSnapshotStore::new(&path).load().await.unwrap();
        assert_eq!(loaded, vec![snapshot(3.0)]);
    }
}
