//! Payment service HTTP surface
//!
//! Routes:
//! - `POST /payments` — process a payment (201, 400, 429, 503)
//! - `GET /health` — liveness
//! - `GET /metrics` — counters plus live resilience gauges
//! - `GET /chaos/lag` / `PUT /chaos/lag` — lag controller admin

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use loadlab_common::chaos::{DependencyClass, LagController};
use loadlab_core::{PaymentPipeline, PipelineError};
use loadlab_domain::{LagSnapshot, LagUpdate, LoadLabError, PaymentRequest};
use loadlab_infra::PaymentMetrics;
use serde_json::json;
use tracing::info;

use crate::correlation::{correlation_id_from, stamp_correlation};

/// Shared state behind the payment router.
pub struct PaymentState {
    pub pipeline: PaymentPipeline,
    pub lag: Arc<LagController>,
    pub metrics: Arc<PaymentMetrics>,
}

/// Build the payment service router.
pub fn payment_router(state: Arc<PaymentState>) -> Router {
    Router::new()
        .route("/payments", post(create_payment))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/chaos/lag", get(get_lag).put(put_lag))
        .with_state(state)
}

async fn create_payment(
    State(state): State<Arc<PaymentState>>,
    headers: HeaderMap,
    Json(request): Json<PaymentRequest>,
) -> Response {
    let correlation_id = correlation_id_from(&headers);
    state.metrics.record_request();

    if let Err(message) = validate(&request) {
        return error_response(
            StatusCode::BAD_REQUEST,
            LoadLabError::InvalidInput(message),
            &correlation_id,
        );
    }

    match state.pipeline.process(request, &correlation_id).await {
        Ok(processed) => {
            state.metrics.record_processed(processed.cache_hit, &processed.lag_injections);
            let mut response =
                (StatusCode::CREATED, Json(processed.response)).into_response();
            stamp_correlation(response.headers_mut(), &correlation_id);
            response
        }
        Err(PipelineError::RateLimited) => {
            state.metrics.record_rate_limited();
            error_response(
                StatusCode::TOO_MANY_REQUESTS,
                LoadLabError::Dependency("rate limit exceeded".to_string()),
                &correlation_id,
            )
        }
        Err(PipelineError::CircuitOpen) => {
            state.metrics.record_circuit_open();
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                LoadLabError::Dependency("circuit breaker is open".to_string()),
                &correlation_id,
            )
        }
        Err(PipelineError::DependencyFailed(message)) => {
            state.metrics.record_dependency_failed();
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                LoadLabError::Dependency(message),
                &correlation_id,
            )
        }
    }
}

fn validate(request: &PaymentRequest) -> Result<(), String> {
    if request.account_id.trim().is_empty() {
        return Err("accountId must not be empty".to_string());
    }
    if !request.amount.is_finite() || request.amount <= 0.0 {
        return Err("amount must be a positive number".to_string());
    }
    if request.currency.trim().is_empty() {
        return Err("currency must not be empty".to_string());
    }
    Ok(())
}

fn error_response(status: StatusCode, error: LoadLabError, correlation_id: &str) -> Response {
    let mut response = (status, Json(error)).into_response();
    stamp_correlation(response.headers_mut(), correlation_id);
    response
}

async fn health() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}

async fn metrics(State(state): State<Arc<PaymentState>>) -> Response {
    let snapshot = state.metrics.snapshot(
        state.pipeline.breaker_state().kind().to_string(),
        state.pipeline.available_tokens(),
    );
    Json(snapshot).into_response()
}

async fn get_lag(State(state): State<Arc<PaymentState>>) -> Response {
    Json(lag_snapshot(&state.lag)).into_response()
}

async fn put_lag(
    State(state): State<Arc<PaymentState>>,
    Json(update): Json<LagUpdate>,
) -> Response {
    if let Some(enabled) = update.enabled {
        state.lag.set_enabled(enabled);
    }
    if let Some(probability) = update.injection_probability {
        state.lag.set_injection_probability(probability);
    }
    if let Some(ms) = update.database_delay_ms {
        state.lag.set_delay(DependencyClass::Database, Duration::from_millis(ms));
    }
    if let Some(ms) = update.cache_delay_ms {
        state.lag.set_delay(DependencyClass::Cache, Duration::from_millis(ms));
    }
    if let Some(ms) = update.external_delay_ms {
        state.lag.set_delay(DependencyClass::External, Duration::from_millis(ms));
    }

    let snapshot = lag_snapshot(&state.lag);
    info!(
        enabled = snapshot.enabled,
        probability = snapshot.injection_probability,
        "lag settings updated"
    );
    Json(snapshot).into_response()
}

fn lag_snapshot(lag: &LagController) -> LagSnapshot {
    LagSnapshot {
        enabled: lag.is_enabled(),
        injection_probability: lag.injection_probability(),
        database_delay_ms: lag.delay(DependencyClass::Database).as_millis() as u64,
        cache_delay_ms: lag.delay(DependencyClass::Cache).as_millis() as u64,
        external_delay_ms: lag.delay(DependencyClass::External).as_millis() as u64,
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use loadlab_core::NullPublisher;
    use loadlab_domain::{constants, BreakerSettings, RateLimitSettings};
    use tower::ServiceExt;

    use super::*;

    fn router_with(capacity: u64) -> Router {
        let lag = Arc::new(LagController::default());
        let rate_limit =
            RateLimitSettings { capacity, refill_interval: Duration::from_secs(3600) };
        let pipeline = PaymentPipeline::new(
            &rate_limit,
            &BreakerSettings::default(),
            Arc::clone(&lag),
            Arc::new(NullPublisher),
        )
        .unwrap()
        .with_probe_failure_probability(0.0);

        payment_router(Arc::new(PaymentState {
            pipeline,
            lag,
            metrics: Arc::new(PaymentMetrics::new()),
        }))
    }

    fn payment_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/payments")
            .header("content-type", "application/json")
            .header(constants::CORRELATION_HEADER, "corr-test")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn valid_payment_returns_created_with_correlation() {
        let router = router_with(10);
        let response = router
            .oneshot(payment_request(r#"{"accountId":"acc-1","amount":10.0,"currency":"USD"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers().get(constants::CORRELATION_HEADER).unwrap(), "corr-test");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "PROCESSED");
        assert!(body["paymentId"].as_str().unwrap().starts_with("pay-"));
    }

    #[tokio::test]
    async fn invalid_amount_is_rejected_with_bad_request() {
        let router = router_with(10);
        let response = router
            .oneshot(payment_request(r#"{"accountId":"acc-1","amount":-5.0,"currency":"USD"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["type"], "InvalidInput");
    }

    #[tokio::test]
    async fn exhausted_budget_returns_too_many_requests() {
        let router = router_with(1);

        let ok = router
            .clone()
            .oneshot(payment_request(r#"{"accountId":"a","amount":1.0,"currency":"USD"}"#))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::CREATED);

        let rejected = router
            .oneshot(payment_request(r#"{"accountId":"a","amount":1.0,"currency":"USD"}"#))
            .await
            .unwrap();
        assert_eq!(rejected.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let router = router_with(10);
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_expose_counters_and_gauges() {
        let router = router_with(5);

        let _ = router
            .clone()
            .oneshot(payment_request(r#"{"accountId":"a","amount":1.0,"currency":"USD"}"#))
            .await
            .unwrap();

        let response = router
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["requestsTotal"], 1);
        assert_eq!(body["processedTotal"], 1);
        assert_eq!(body["circuitState"], "closed");
        assert_eq!(body["availableTokens"], 4);
    }

    #[tokio::test]
    async fn chaos_endpoint_round_trips_partial_updates() {
        let router = router_with(10);

        let update = r#"{"enabled":true,"injectionProbability":0.5,"databaseDelayMs":750}"#;
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/chaos/lag")
                    .header("content-type", "application/json")
                    .body(Body::from(update))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["enabled"], true);
        assert_eq!(body["injectionProbability"], 0.5);
        assert_eq!(body["databaseDelayMs"], 750);
        // Untouched fields keep their defaults.
        assert_eq!(body["cacheDelayMs"], 500);

        let read_back = router
            .oneshot(Request::builder().uri("/chaos/lag").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(read_back.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["enabled"], true);
        assert_eq!(body["databaseDelayMs"], 750);
    }

    #[tokio::test]
    async fn chaos_probability_is_clamped() {
        let router = router_with(10);

        let response = router
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/chaos/lag")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"injectionProbability":7.5}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["injectionProbability"], 1.0);
    }
}
