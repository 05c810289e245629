/// Base Utility Scoring
///
/// Maps engagement counters to the utility that the boost agent nudges.
///
///   base = (clicks * 2.0 + reward) / max(views, 1) - skips * 0.5
use crate::models::EngagementCounters;

const CLICK_WEIGHT: f64 = 2.0;
const SKIP_PENALTY: f64 = 0.5;

/// Pure and total: zero views count as one.
pub fn base_score(counters: &EngagementCounters) -> f64 {
    let views = counters.views.max(1) as f64;
    (counters.clicks as f64 * CLICK_WEIGHT + counters.reward) / views
        - counters.skips as f64 * SKIP_PENALTY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_views_treated_as_one() {
        let counters = EngagementCounters {
            views: 0,
            clicks: 0,
            skips: 0,
            reward: 0.7,
            total_dwell_time: 0.0,
        };
        assert!((base_score(&counters) - 0.7).abs() < 1e-9);
        assert_eq!(base_score(&EngagementCounters::default()), 0.0);
    }

    #[test]
    fn test_formula() {
        // 2 clicks, 1 skip, 4 views, reward 2.0 + 0.5 - 0.2
        let counters = EngagementCounters {
            views: 4,
            clicks: 2,
            skips: 1,
            reward: 2.3,
            total_dwell_time: 3.0,
        };
        let expected = (2.0 * 2.0 + 2.3) / 4.0 - 0.5;
        assert!((base_score(&counters) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_skips_lower_the_score() {
        let clicked = EngagementCounters {
            views: 1,
            clicks: 1,
            reward: 1.0,
            ..Default::default()
        };
        let skipped = EngagementCounters {
            views: 1,
            skips: 1,
            reward: -0.2,
            ..Default::default()
        };
        assert!(base_score(&clicked) > base_score(&skipped));
        assert!(base_score(&skipped) < 0.0);
    }
}
