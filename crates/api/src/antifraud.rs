//! Antifraud service HTTP surface
//!
//! Routes:
//! - `POST /events` — score a payment event, returns the verdict
//! - `GET /health` — liveness
//! - `GET /metrics` — scoring counters

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use loadlab_core::FraudAnalyzer;
use loadlab_domain::PaymentEvent;
use loadlab_infra::AntifraudMetrics;
use serde_json::json;

use crate::correlation::stamp_correlation;

/// Shared state behind the antifraud router.
pub struct AntifraudState {
    pub analyzer: FraudAnalyzer,
    pub metrics: Arc<AntifraudMetrics>,
}

/// Build the antifraud service router.
pub fn antifraud_router(state: Arc<AntifraudState>) -> Router {
    Router::new()
        .route("/events", post(score_event))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
}

async fn score_event(
    State(state): State<Arc<AntifraudState>>,
    Json(event): Json<PaymentEvent>,
) -> Response {
    let verdict = state.analyzer.analyze(&event).await;
    state.metrics.record_event(verdict.fraud_detected);

    let correlation_id = verdict.correlation_id.clone();
    let mut response = (StatusCode::OK, Json(verdict)).into_response();
    stamp_correlation(response.headers_mut(), &correlation_id);
    response
}

async fn health() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}

async fn metrics(State(state): State<Arc<AntifraudState>>) -> Response {
    Json(state.metrics.snapshot()).into_response()
}
