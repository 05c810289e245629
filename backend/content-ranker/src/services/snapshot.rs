/// Metrics Snapshotter
///
/// Derives aggregate statistics from the engagement store.
use crate::models::{MetricsSnapshot, TopItem};
use crate::services::store::EngagementStore;
use crate::utils::ratio;

pub const TOP_ITEMS: usize = 5;

pub fn take_snapshot(store: &EngagementStore, timestamp: f64) -> MetricsSnapshot {
    let total_items = store.len();

    let (mut total_views, mut total_clicks, mut total_reward, mut total_dwell) =
        (0u64, 0u64, 0.0f64, 0.0f64);
    for (_, counters) in store.engagement() {
        total_views += counters.views;
        total_clicks += counters.clicks;
        total_reward += counters.reward;
        total_dwell += counters.total_dwell_time;
    }

    let mut ranked: Vec<_> = store.engagement().collect();
    // Ties broken by id so repeated snapshots agree
    ranked.sort_by(|a, b| b.1.reward.total_cmp(&a.1.reward).then_with(|| a.0.cmp(b.0)));

    let top_items = ranked
        .into_iter()
        .take(TOP_ITEMS)
        .map(|(id, counters)| TopItem {
            id: id.clone(),
            score: counters.reward,
            ctr: counters.ctr(),
            metadata: store
                .get_content(id)
                .map(|item| item.metadata.clone())
                .unwrap_or_default(),
        })
        .collect();

    MetricsSnapshot {
        timestamp,
        total_items,
        avg_engagement: ratio(total_reward, total_items as f64),
        ctr: ratio(total_clicks as f64, total_views as f64),
        avg_view_time: ratio(total_dwell, total_views as f64),
        top_items,
    }
}
