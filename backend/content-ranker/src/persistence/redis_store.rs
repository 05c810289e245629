// Redis keys:
// - {key} - List of JSON-encoded snapshots, oldest at the head

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, warn};

use super::SnapshotStore;
use crate::error::Result;
use crate::models::MetricsSnapshot;

pub struct RedisSnapshotStore {
    redis: redis::Client,
    key: String,
}

impl RedisSnapshotStore {
    const DEFAULT_KEY: &'static str = "content_ranker:metrics_history";

    pub fn new(redis: redis::Client) -> Self {
        Self {
            redis,
            key: Self::DEFAULT_KEY.to_string(),
        }
    }

    /// Create with custom list key
    pub fn with_key(mut self, key: &str) -> Self {
        self.key = key.to_string();
        self
    }
}

#[async_trait]
impl SnapshotStore for RedisSnapshotStore {
    async fn load(&self) -> Result<Vec<MetricsSnapshot>> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let records: Vec<String> = conn.lrange(&self.key, 0, -1).await?;

        let snapshots: Vec<MetricsSnapshot> = records
            .iter()
            .filter_map(|json| match serde_json::from_str(json) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    warn!(key = %self.key, error = %e, "Skipping unreadable snapshot record");
                    None
                }
            })
            .collect();

        debug!(key = %self.key, count = snapshots.len(), "Loaded snapshot history");

        Ok(snapshots)
    }

    async fn append(&self, snapshot: &MetricsSnapshot) -> Result<()> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let json = serde_json::to_string(snapshot)?;
        let _: () = conn.rpush(&self.key, json).await?;

        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let _: () = conn.del(&self.key).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_against_live_redis() {
        // Requires a reachable Redis; skipped otherwise
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        let client = match redis::Client::open(redis_url.clone()) {
            Ok(client) => match client.get_multiplexed_async_connection().await {
                Ok(_) => client,
                Err(_) => {
                    println!("Skipping: Redis unreachable at {}", redis_url);
                    return;
                }
            },
            Err(_) => {
                println!("Skipping: invalid Redis URL");
                return;
            }
        };

        let key = format!("content_ranker:test:{}", uuid::Uuid::new_v4());
        let store = RedisSnapshotStore::new(client).with_key(&key);
        let snapshot = MetricsSnapshot {
            timestamp: 1.0,
            total_items: 2,
            avg_engagement: 0.1,
            ctr: 0.2,
            avg_view_time: 0.3,
            top_items: Vec::new(),
        };

        store.append(&snapshot).await.unwrap();
        assert_eq!(store.load().await.unwrap(), vec![snapshot]);

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }
}
