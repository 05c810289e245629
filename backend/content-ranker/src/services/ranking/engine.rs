use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::scorer::base_score;
use crate::config::Config;
use crate::error::{RankerError, Result};
use crate::metrics;
use crate::models::{
    BoostAction, ContentItem, EventKind, FeedbackEvent, Metadata, MetricsReport, MetricsSnapshot,
    NewContent, RankedItem, RecordedEvent, ResetMode,
};
use crate::persistence::SnapshotWriter;
use crate::services::exploration::{BoostPolicy, OrderPolicy};
use crate::services::snapshot::take_snapshot;
use crate::services::store::EngagementStore;
use crate::utils::{now_seconds, round_to};

const DEMO_CONTENT_COUNT: usize = 3;

/// Tunables of the ranking engine
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub bandit_epsilon: f64,
    pub agent_alpha: f64,
    pub agent_gamma: f64,
    pub agent_epsilon: f64,
    pub history_capacity: usize,
    pub retrain_chunk_size: usize,
    pub seed_demo_content: bool,
    pub rng_seed: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            bandit_epsilon: 0.15,
            agent_alpha: 0.2,
            agent_gamma: 0.9,
            agent_epsilon: 0.1,
            history_capacity: 10_000,
            retrain_chunk_size: 1_000,
            seed_demo_content: false,
            rng_seed: None,
        }
    }
}

impl From<&Config> for EngineSettings {
    fn from(config: &Config) -> Self {
        Self {
            bandit_epsilon: config.bandit_epsilon,
            agent_alpha: config.agent_alpha,
            agent_gamma: config.agent_gamma,
            agent_epsilon: config.agent_epsilon,
            history_capacity: config.history_capacity,
            retrain_chunk_size: config.retrain_chunk_size,
            seed_demo_content: config.seed_demo_content,
            rng_seed: config.rng_seed,
        }
    }
}

/// Everything guarded by the engine lock
struct EngineState {
    store: EngagementStore,
    order_policy: OrderPolicy,
    boost_policy: BoostPolicy,
    /// Cached permutation of content ids; empty means "not computed"
    stable_order: Vec<String>,
    metrics_history: Vec<MetricsSnapshot>,
    rng: StdRng,
}

impl EngineState {
    /// 1-based position in the cached order, 0 when absent
    fn previous_rank(&self, id: &str) -> usize {
        self.stable_order
            .iter()
            .position(|cached| cached == id)
            .map(|pos| pos + 1)
            .unwrap_or(0)
    }

    /// Every cached id with its 1-based position
    fn rank_map(&self) -> HashMap<String, usize> {
        self.stable_order
            .iter()
            .enumerate()
            .map(|(pos, id)| (id.clone(), pos + 1))
            .collect()
    }

    fn ensure_stable_order(&mut self, epsilon: f64) {
        if !self.stable_order.is_empty() {
            return;
        }
        let ids = self.store.list_content_ids();
        if ids.is_empty() {
            return;
        }
        self.stable_order = self.order_policy.choose_order(&ids, epsilon, &mut self.rng);
        debug!(count = self.stable_order.len(), "Cached stable order");
    }

    fn record_snapshot(&mut self) -> MetricsSnapshot {
        let snapshot = take_snapshot(&self.store, now_seconds());
        self.metrics_history.push(snapshot.clone());
        snapshot
    }

    /// Ranks come from `ranks`, not the live cache, so one retrain sees a single order.
    fn replay(&mut self, event: &RecordedEvent, ranks: &HashMap<String, usize>) -> bool {
        let category = match self.store.get_content(&event.content_id) {
            Some(item) => item.category(),
            None => return false,
        };
        let rank = ranks.get(&event.content_id).copied().unwrap_or(0);
        let state_key = BoostPolicy::state_key(&category, rank);
        self.boost_policy.update(
            &state_key,
            BoostAction::from_reward(event.reward),
            event.reward,
        );
        true
    }

    fn seed_demo_content(&mut self) {
        let created_at = now_seconds();
        for i in 1..=DEMO_CONTENT_COUNT {
            let mut metadata = Metadata::new();
            metadata.insert("title".to_string(), format!("Test Content #{}", i).as_str().into());
            metadata.insert("category".to_string(), "test".into());
            metadata.insert("seed".to_string(), (i as f64).into());
            self.store.add_content(ContentItem {
                id: format!("test-content-{}", i),
                metadata,
                created_at,
            });
        }
    }
}

/// Online ranking engine
///
/// Constructed once at startup and shared by reference with every request
/// handler. All read-modify-write sequences run under a single lock.
pub struct RankingEngine {
    settings: EngineSettings,
    state: Mutex<EngineState>,
    writer: SnapshotWriter,
}

impl RankingEngine {
    pub fn new(
        settings: EngineSettings,
        writer: SnapshotWriter,
        metrics_history: Vec<MetricsSnapshot>,
    ) -> Self {
        let rng = match settings.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut state = EngineState {
            store: EngagementStore::new(settings.history_capacity),
            order_policy: OrderPolicy::new(),
            boost_policy: BoostPolicy::new(settings.agent_alpha, settings.agent_gamma),
            stable_order: Vec::new(),
            metrics_history,
            rng,
        };
        if settings.seed_demo_content {
            state.seed_demo_content();
        }

        Self {
            settings,
            state: Mutex::new(state),
            writer,
        }
    }

    /// Store a content item and return its id.
    pub async fn submit_content(&self, content: NewContent) -> String {
        let item = content.into_item();
        let id = item.id.clone();

        self.state.lock().await.store.add_content(item);
        info!(content_id = %id, "Content submitted");

        id
    }

    pub async fn get_content(&self, id: &str) -> Option<ContentItem> {
        self.state.lock().await.store.get_content(id).cloned()
    }

    /// Ranked slice `[offset, offset + limit)` of the current feed.
    ///
    /// Items are visited in the cached stable order; the returned order comes
    /// from the final score (descending) with older items first on ties.
    pub async fn ranked_feed(&self, limit: usize, offset: usize, use_agent: bool) -> Vec<RankedItem> {
        let started = Instant::now();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        state.ensure_stable_order(self.settings.bandit_epsilon);

        let positions: HashMap<&str, usize> = state
            .stable_order
            .iter()
            .enumerate()
            .map(|(pos, id)| (id.as_str(), pos + 1))
            .collect();

        let mut items = Vec::with_capacity(state.stable_order.len());
        for id in &state.stable_order {
            let Some(content) = state.store.get_content(id) else {
                continue;
            };
            let rank = positions.get(id.as_str()).copied().unwrap_or(0);
            let counters = state.store.counters(id);
            let base = base_score(&counters);

            let (action, boost) = if use_agent {
                let state_key = BoostPolicy::state_key(&content.category(), rank);
                let action = state.boost_policy.select_action(
                    &state_key,
                    self.settings.agent_epsilon,
                    &mut state.rng,
                );
                (action, state.boost_policy.boost_value(&state_key, action))
            } else {
                (BoostAction::Hold, 0.0)
            };

            items.push(RankedItem {
                id: id.clone(),
                score: round_to(base + boost, 3),
                base_score: base,
                boost_action: action.index() as u8,
                boost_value: boost,
                metadata: content.metadata.clone(),
                created_at: content.created_at,
                previous_rank: rank,
                current_rank: rank,
                rank_change: 0,
                ctr: counters.ctr(),
            });
        }
        drop(guard);

        items.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.created_at.total_cmp(&b.created_at))
        });

        metrics::record_feed_build(use_agent, started.elapsed());
        debug!(
            total = items.len(),
            limit = limit,
            offset = offset,
            use_agent = use_agent,
            "Ranked feed computed"
        );

        items.into_iter().skip(offset).take(limit).collect()
    }

    /// Apply one engagement signal and return its reward.
    ///
    /// Updates both policies but leaves the cached stable order untouched.
    pub async fn process_feedback(&self, event: FeedbackEvent) -> Result<f64> {
        let mut state = self.state.lock().await;

        let category = state
            .store
            .get_content(&event.content_id)
            .map(|item| item.category())
            .ok_or_else(|| {
                RankerError::NotFound(format!("content {} not found", event.content_id))
            })?;

        let reward = state
            .store
            .apply_feedback(&event.content_id, event.kind, event.dwell_time);
        state.order_policy.update(&event.content_id, reward);

        let state_key = BoostPolicy::state_key(&category, state.previous_rank(&event.content_id));
        state
            .boost_policy
            .update(&state_key, BoostAction::from_reward(reward), reward);

        let snapshot = state.record_snapshot();
        drop(state);

        self.writer.append(snapshot);
        metrics::record_feedback(event.kind.as_str());

        debug!(
            content_id = %event.content_id,
            event = event.kind.as_str(),
            reward = reward,
            state = %state_key,
            "Feedback processed"
        );

        Ok(reward)
    }

    /// Replay the event history `iterations` times through the boost agent,
    /// then drop the cached order. Returns `iterations`.
    ///
    /// The history and the cached ranks are copied up front and replayed in
    /// chunks so concurrent requests can interleave between chunks.
    pub async fn retrain(&self, iterations: usize) -> usize {
        let (events, ranks) = {
            let state = self.state.lock().await;
            (state.store.history_snapshot(), state.rank_map())
        };
        let chunk_size = self.settings.retrain_chunk_size.max(1);

        let mut replayed = 0usize;
        let mut skipped = 0usize;
        if !events.is_empty() {
            for _ in 0..iterations {
                for chunk in events.chunks(chunk_size) {
                    {
                        let mut state = self.state.lock().await;
                        for event in chunk {
                            if state.replay(event, &ranks) {
                                replayed += 1;
                            } else {
                                skipped += 1;
                            }
                        }
                    }
                    tokio::task::yield_now().await;
                }
            }
        }

        self.state.lock().await.stable_order.clear();
        metrics::record_retrain();

        let oldest = events.first().map(|event| event.recorded_at).unwrap_or(0.0);
        let newest = events.last().map(|event| event.recorded_at).unwrap_or(0.0);
        info!(
            iterations = iterations,
            history = events.len(),
            history_span_secs = newest - oldest,
            replayed = replayed,
            skipped = skipped,
            "Boost agent retrained"
        );

        iterations
    }

    pub async fn reset(&self, mode: ResetMode) {
        let mut state = self.state.lock().await;

        state.store.reset();
        state.order_policy.clear();
        state.stable_order.clear();

        if mode == ResetMode::Full {
            state.metrics_history.clear();
            self.writer.clear();
        }

        if self.settings.seed_demo_content {
            state.seed_demo_content();
        }

        info!(mode = mode.as_str(), "System reset");
    }

    /// Take a fresh snapshot and return it with the full history.
    pub async fn metrics(&self) -> MetricsReport {
        let mut state = self.state.lock().await;
        let latest = state.record_snapshot();
        let history = state.metrics_history.clone();
        drop(state);

        self.writer.append(latest.clone());

        MetricsReport { latest, history }
    }

    /// Metrics history without taking a new snapshot
    pub async fn metrics_history(&self) -> Vec<MetricsSnapshot> {
        self.state.lock().await.metrics_history.clone()
    }

    /// Cached stable order, empty when not computed yet
    pub async fn stable_order(&self) -> Vec<String> {
        self.state.lock().await.stable_order.clone()
    }

    pub async fn order_value(&self, id: &str) -> f64 {
        self.state.lock().await.order_policy.value(id)
    }

    pub async fn boost_q_values(&self, state_key: &str) -> [f64; 2] {
        self.state.lock().await.boost_policy.q_values(state_key)
    }

    pub async fn history_len(&self) -> usize {
        self.state.lock().await.store.history_len()
    }

    pub async fn content_count(&self) -> usize {
        self.state.lock().await.store.len()
    }

    /// Convenience wrapper used by the HTTP layer
    pub async fn feedback(
        &self,
        content_id: &str,
        kind: EventKind,
        dwell_time: Option<f64>,
    ) -> Result<f64> {
        self.process_feedback(FeedbackEvent::new(content_id, kind, dwell_time))
            .await
    }
}
