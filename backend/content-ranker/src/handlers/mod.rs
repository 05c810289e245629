/// Content Ranker HTTP Handlers
///
/// Thin adapter over `RankingEngine`; all ranking semantics live in the engine.
use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use crate::error::{RankerError, Result};
use crate::metrics;
use crate::models::{EventKind, NewContent, ResetMode};
use crate::services::RankingEngine;

/// Query parameters for GET /ranked-feed
#[derive(Debug, Deserialize)]
pub struct RankedFeedQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,

    #[serde(default)]
    pub offset: usize,

    /// Apply the boost agent
    #[serde(default)]
    pub use_qagent: bool,
}

fn default_limit() -> usize {
    10
}

/// Engagement feedback request
#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub content_id: String,
    pub event: String, // "view", "click", "skip"
    #[serde(default)]
    pub view_time: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct TrainQuery {
    #[serde(default = "default_iterations")]
    pub iterations: usize,
}

fn default_iterations() -> usize {
    100
}

#[derive(Debug, Deserialize)]
pub struct ResetQuery {
    #[serde(default = "default_reset_mode")]
    pub mode: String,
}

fn default_reset_mode() -> String {
    "order".to_string()
}

/// POST /submit-content
#[post("/submit-content")]
pub async fn submit_content(
    engine: web::Data<RankingEngine>,
    body: web::Json<NewContent>,
) -> Result<HttpResponse> {
    let id = engine.submit_content(body.into_inner()).await;
    Ok(HttpResponse::Ok().json(json!({ "ok": true, "id": id })))
}

/// GET /ranked-feed
#[get("/ranked-feed")]
pub async fn ranked_feed(
    engine: web::Data<RankingEngine>,
    query: web::Query<RankedFeedQuery>,
) -> Result<HttpResponse> {
    debug!(
        "Ranked feed request: limit={}, offset={}, use_qagent={}",
        query.limit, query.offset, query.use_qagent
    );

    let items = engine
        .ranked_feed(query.limit, query.offset, query.use_qagent)
        .await;
    Ok(HttpResponse::Ok().json(items))
}

/// POST /engagement-feedback
#[post("/engagement-feedback")]
pub async fn engagement_feedback(
    engine: web::Data<RankingEngine>,
    body: web::Json<FeedbackRequest>,
) -> Result<HttpResponse> {
    let kind: EventKind = body.event.parse()?;
    let reward = engine
        .feedback(&body.content_id, kind, body.view_time)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "ok": true, "reward": reward })))
}

/// POST /train-agent
#[post("/train-agent")]
pub async fn train_agent(
    engine: web::Data<RankingEngine>,
    query: web::Query<TrainQuery>,
) -> Result<HttpResponse> {
    let trained = engine.retrain(query.iterations).await;
    Ok(HttpResponse::Ok().json(json!({ "ok": true, "trained_iterations": trained })))
}

/// POST /reset
#[post("/reset")]
pub async fn reset(
    engine: web::Data<RankingEngine>,
    query: web::Query<ResetQuery>,
) -> Result<HttpResponse> {
    let mode: ResetMode = query.mode.parse()?;
    engine.reset(mode).await;

    Ok(HttpResponse::Ok().json(json!({
        "ok": true,
        "message": "System reset",
        "mode": mode.as_str()
    })))
}

/// GET /metrics
///
/// Latest snapshot fields plus the full history
#[get("/metrics")]
pub async fn get_metrics(engine: web::Data<RankingEngine>) -> Result<HttpResponse> {
    let report = engine.metrics().await;
    Ok(HttpResponse::Ok().json(report))
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// GET /internal/prometheus
#[get("/internal/prometheus")]
pub async fn prometheus_metrics() -> Result<HttpResponse> {
    let body = metrics::render().map_err(|e| {
        error!("Prometheus encoding failed: {}", e);
        RankerError::Internal("metrics encoding error".to_string())
    })?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(submit_content)
        .service(ranked_feed)
        .service(engagement_feedback)
        .service(train_agent)
        .service(reset)
        .service(get_metrics)
        .service(health)
        .service(prometheus_metrics);
}
