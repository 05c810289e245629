// ============================================
// Metrics Snapshot Persistence
// ============================================
//
// The engine never performs I/O itself. It hands snapshots to a
// SnapshotWriter, whose background task applies them to a SnapshotStore
// in submission order. Failures are logged and counted, never returned
// to request handlers.
//
// Record format: one JSON-encoded MetricsSnapshot per line / list entry,
// no schema version.

pub mod file;
pub mod redis_store;
pub mod writer;

pub use file::JsonLinesSnapshotStore;
pub use redis_store::RedisSnapshotStore;
pub use writer::SnapshotWriter;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::config::{Config, SnapshotBackend};
use crate::error::Result;
use crate::models::MetricsSnapshot;

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Full history, oldest first
    async fn load(&self) -> Result<Vec<MetricsSnapshot>>;

    async fn append(&self, snapshot: &MetricsSnapshot) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}

/// Discards everything; used when persistence is disabled.
#[derive(Debug, Default)]
pub struct NoopSnapshotStore;

#[async_trait]
impl SnapshotStore for NoopSnapshotStore {
    async fn load(&self) -> Result<Vec<MetricsSnapshot>> {
        Ok(Vec::new())
    }

    async fn append(&self, _snapshot: &MetricsSnapshot) -> Result<()> {
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }
}

pub fn build_snapshot_store(config: &Config) -> Result<Arc<dyn SnapshotStore>> {
    let store: Arc<dyn SnapshotStore> = match config.snapshot_backend {
        SnapshotBackend::File => {
            info!(path = %config.snapshot_path, "Using JSON-lines snapshot store");
            Arc::new(JsonLinesSnapshotStore::new(&config.snapshot_path))
        }
        SnapshotBackend::Redis => {
            info!(key = %config.snapshot_redis_key, "Using Redis snapshot store");
            let client = redis::Client::open(config.redis_url.as_str())?;
            Arc::new(RedisSnapshotStore::new(client).with_key(&config.snapshot_redis_key))
        }
        SnapshotBackend::None => {
            info!("Snapshot persistence disabled");
            Arc::new(NoopSnapshotStore)
        }
    };

    Ok(store)
}
