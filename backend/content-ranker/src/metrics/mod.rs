//! Ranker Metrics
//!
//! Prometheus metrics for feedback processing, feed builds and persistence

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};
use std::time::Duration;

static FEEDBACK_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "content_ranker_feedback_events_total",
        "Total feedback events processed by kind",
        &["event"]
    )
    .expect("Failed to register feedback events metric")
});

static FEED_BUILD_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "content_ranker_feed_build_duration_seconds",
        "Duration of ranked feed computation",
        &["agent"],
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]
    )
    .expect("Failed to register feed build duration metric")
});

static RETRAIN_RUNS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "content_ranker_retrain_runs_total",
        "Total boost agent retraining runs"
    )
    .expect("Failed to register retrain runs metric")
});

static SNAPSHOT_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "content_ranker_snapshot_failures_total",
        "Metrics snapshot persistence failures by operation",
        &["operation"]
    )
    .expect("Failed to register snapshot failures metric")
});

/// Record one processed feedback event
pub fn record_feedback(event: &str) {
    FEEDBACK_EVENTS_TOTAL.with_label_values(&[event]).inc();
}

/// Record ranked feed computation time
pub fn record_feed_build(use_agent: bool, duration: Duration) {
    let label = if use_agent { "on" } else { "off" };
    FEED_BUILD_DURATION_SECONDS
        .with_label_values(&[label])
        .observe(duration.as_secs_f64());
}

pub fn record_retrain() {
    RETRAIN_RUNS_TOTAL.inc();
}

pub fn record_snapshot_failure(operation: &str) {
    SNAPSHOT_FAILURES_TOTAL.with_label_values(&[operation]).inc();
}

/// Text exposition of the default registry
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
