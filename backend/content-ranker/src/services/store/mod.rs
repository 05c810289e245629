// ============================================
// Engagement Store
// ============================================
//
// Ground truth for scoring: content records, per-content engagement
// counters and the bounded feedback history used by retraining.
//
// Reward rule:
//   click            → +1.0
//   view, dwell > 1.5 → +0.5
//   view, dwell ≤ 1.5 →  0.0
//   skip             → -0.2

use std::collections::{HashMap, VecDeque};
use tracing::debug;

use crate::models::{ContentItem, EngagementCounters, EventKind, RecordedEvent};
use crate::utils::now_seconds;

/// Dwell time (seconds) above which a view earns a reward
pub const ENGAGED_VIEW_SECONDS: f64 = 1.5;

pub const CLICK_REWARD: f64 = 1.0;
pub const ENGAGED_VIEW_REWARD: f64 = 0.5;
pub const SKIP_REWARD: f64 = -0.2;

/// Reward earned by a single feedback event
pub fn reward_for(kind: EventKind, dwell_time: Option<f64>) -> f64 {
    match kind {
        EventKind::Click => CLICK_REWARD,
        EventKind::View if dwell_time.unwrap_or(0.0) > ENGAGED_VIEW_SECONDS => ENGAGED_VIEW_REWARD,
        EventKind::View => 0.0,
        EventKind::Skip => SKIP_REWARD,
    }
}

pub struct EngagementStore {
    contents: HashMap<String, ContentItem>,
    /// Insertion order of content ids
    order: Vec<String>,
    engagement: HashMap<String, EngagementCounters>,
    history: VecDeque<RecordedEvent>,
    history_capacity: usize,
}

impl EngagementStore {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            contents: HashMap::new(),
            order: Vec::new(),
            engagement: HashMap::new(),
            history: VecDeque::with_capacity(history_capacity.min(1024)),
            history_capacity: history_capacity.max(1),
        }
    }

    /// Insert or overwrite by id; last write wins.
    pub fn add_content(&mut self, item: ContentItem) {
        if !self.contents.contains_key(&item.id) {
            self.order.push(item.id.clone());
        }
        self.contents.insert(item.id.clone(), item);
    }

    pub fn get_content(&self, id: &str) -> Option<&ContentItem> {
        self.contents.get(id)
    }

    pub fn list_content_ids(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Counters for an id, zeros when nothing was recorded yet
    pub fn counters(&self, id: &str) -> EngagementCounters {
        self.engagement.get(id).cloned().unwrap_or_default()
    }

    fn counters_mut(&mut self, id: &str) -> &mut EngagementCounters {
        self.engagement.entry(id.to_string()).or_default()
    }

    pub fn engagement(&self) -> impl Iterator<Item = (&String, &EngagementCounters)> {
        self.engagement.iter()
    }

    /// Record one feedback event and return its reward.
    pub fn apply_feedback(&mut self, id: &str, kind: EventKind, dwell_time: Option<f64>) -> f64 {
        let reward = reward_for(kind, dwell_time);

        let counters = self.counters_mut(id);
        match kind {
            EventKind::View => {
                counters.views += 1;
                if let Some(dwell) = dwell_time.filter(|d| d.is_finite() && *d > 0.0) {
                    counters.total_dwell_time += dwell;
                }
            }
            EventKind::Click => {
                counters.clicks += 1;
                counters.views += 1;
            }
            EventKind::Skip => {
                counters.skips += 1;
                counters.views += 1;
            }
        }
        counters.reward += reward;

        debug!(
            content_id = id,
            event = kind.as_str(),
            reward = reward,
            views = counters.views,
            "Applied feedback"
        );

        if self.history.len() == self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(RecordedEvent {
            content_id: id.to_string(),
            kind,
            reward,
            recorded_at: now_seconds(),
        });

        reward
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Copy of the event history, oldest first
    pub fn history_snapshot(&self) -> Vec<RecordedEvent> {
        self.history.iter().cloned().collect()
    }

    /// Drop all content, counters and history.
    pub fn reset(&mut self) {
        self.contents.clear();
        self.order.clear();
        self.engagement.clear();
        self.history.clear();
    }
}
