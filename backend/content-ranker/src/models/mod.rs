use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::RankerError;
use crate::utils::{now_seconds, ratio};

/// Free-form metadata value. Only strings and numbers are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Number(n) => write!(f, "{}", n),
            MetadataValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Number(value)
    }
}

pub type Metadata = BTreeMap<String, MetadataValue>;

/// A rankable content record. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub metadata: Metadata,
    /// Seconds since epoch
    pub created_at: f64,
}

impl ContentItem {
    /// Category used to build the boost agent's context key; empty when absent.
    pub fn category(&self) -> String {
        self.metadata
            .get("category")
            .map(|v| v.to_string())
            .unwrap_or_default()
    }
}

/// Content submission; id and creation time are filled in when missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewContent {
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_at: Option<f64>,
}

impl NewContent {
    pub fn into_item(self) -> ContentItem {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        ContentItem {
            id,
            metadata: self.metadata,
            created_at: self.created_at.unwrap_or_else(now_seconds),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    View,
    Click,
    Skip,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::View => "view",
            EventKind::Click => "click",
            EventKind::Skip => "skip",
        }
    }
}

impl FromStr for EventKind {
    type Err = RankerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(EventKind::View),
            "click" => Ok(EventKind::Click),
            "skip" => Ok(EventKind::Skip),
            other => Err(RankerError::Validation(format!(
                "unknown event kind '{}', expected view, click or skip",
                other
            ))),
        }
    }
}

/// Inbound engagement signal
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackEvent {
    pub content_id: String,
    pub kind: EventKind,
    /// Seconds; only meaningful for views
    pub dwell_time: Option<f64>,
}

impl FeedbackEvent {
    pub fn new(content_id: impl Into<String>, kind: EventKind, dwell_time: Option<f64>) -> Self {
        Self {
            content_id: content_id.into(),
            kind,
            dwell_time,
        }
    }
}

/// Entry of the bounded event history replayed by retraining
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    pub content_id: String,
    pub kind: EventKind,
    pub reward: f64,
    pub recorded_at: f64,
}

/// Per-content engagement counters, created lazily with zeros.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngagementCounters {
    pub views: u64,
    pub clicks: u64,
    pub skips: u64,
    /// Running sum of per-event rewards; negative when skips dominate
    pub reward: f64,
    /// Sum of dwell seconds reported with view events
    pub total_dwell_time: f64,
}

impl EngagementCounters {
    pub fn ctr(&self) -> f64 {
        ratio(self.clicks as f64, self.views as f64)
    }
}

/// Two-action space of the boost agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoostAction {
    Hold,
    Boost,
}

impl BoostAction {
    pub fn index(&self) -> usize {
        match self {
            BoostAction::Hold => 0,
            BoostAction::Boost => 1,
        }
    }

    pub fn from_index(idx: usize) -> Self {
        if idx == 0 {
            BoostAction::Hold
        } else {
            BoostAction::Boost
        }
    }

    /// Action credited to an observed reward during feedback and replay
    pub fn from_reward(reward: f64) -> Self {
        if reward > 0.5 {
            BoostAction::Boost
        } else {
            BoostAction::Hold
        }
    }
}

/// One entry of the ranked feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedItem {
    pub id: String,
    /// base_score + boost_value, rounded to 3 decimals
    pub score: f64,
    pub base_score: f64,
    pub boost_action: u8,
    pub boost_value: f64,
    pub metadata: Metadata,
    pub created_at: f64,
    pub previous_rank: usize,
    pub current_rank: usize,
    pub rank_change: i64,
    pub ctr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopItem {
    pub id: String,
    pub score: f64,
    pub ctr: f64,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Point-in-time aggregate statistics. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: f64,
    pub total_items: usize,
    pub avg_engagement: f64,
    pub ctr: f64,
    pub avg_view_time: f64,
    #[serde(default)]
    pub top_items: Vec<TopItem>,
}

/// Latest snapshot plus the full history
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    #[serde(flatten)]
    pub latest: MetricsSnapshot,
    pub history: Vec<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    /// Clear content, engagement, event history and ordering state
    Order,
    /// Additionally clear the metrics history
    Full,
}

impl ResetMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResetMode::Order => "order",
            ResetMode::Full => "full",
        }
    }
}

impl FromStr for ResetMode {
    type Err = RankerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "order" => Ok(ResetMode::Order),
            "full" => Ok(ResetMode::Full),
            other => Err(RankerError::Validation(format!(
                "unknown reset mode '{}', expected order or full",
                other
            ))),
        }
    }
}
