//! Payload and configuration types shared across the services
//!
//! Wire shapes use camelCase field names to match the traffic the generator
//! has always emitted; downstream dashboards key on them.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants;

/// Inbound payment request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub account_id: String,
    pub amount: f64,
    pub currency: String,
}

/// Terminal status of a processed payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "PROCESSED")]
    Processed,
}

/// Response body for a successful payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub payment_id: String,
    pub status: PaymentStatus,
    pub processed_at: DateTime<Utc>,
}

/// Event published after a payment is processed, consumed by antifraud.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEvent {
    /// Event discriminator, always `"PaymentCreated"`.
    pub event: String,
    pub payment_id: String,
    pub account_id: String,
    pub amount: f64,
    pub currency: String,
    pub correlation_id: String,
    /// Publish time in milliseconds since the Unix epoch.
    pub ts: i64,
}

impl PaymentEvent {
    pub const PAYMENT_CREATED: &'static str = "PaymentCreated";

    /// Build a `PaymentCreated` event stamped with the current time.
    pub fn payment_created(
        payment_id: impl Into<String>,
        request: &PaymentRequest,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            event: Self::PAYMENT_CREATED.to_string(),
            payment_id: payment_id.into(),
            account_id: request.account_id.clone(),
            amount: request.amount,
            currency: request.currency.clone(),
            correlation_id: correlation_id.into(),
            ts: Utc::now().timestamp_millis(),
        }
    }
}

/// Verdict produced by the antifraud scoring step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudVerdict {
    pub payment_id: String,
    pub risk_score: f64,
    pub fraud_detected: bool,
    pub correlation_id: String,
}

/// Generate a correlation ID for a request that arrived without one.
pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a payment identifier.
pub fn new_payment_id() -> String {
    format!("pay-{}", Uuid::new_v4().simple())
}

// ============================================================================
// Chaos admin payloads
// ============================================================================

/// Read-model of the lag controller, returned by the chaos admin endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LagSnapshot {
    pub enabled: bool,
    pub injection_probability: f64,
    pub database_delay_ms: u64,
    pub cache_delay_ms: u64,
    pub external_delay_ms: u64,
}

/// Partial update accepted by the chaos admin endpoint; absent fields keep
/// their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LagUpdate {
    pub enabled: Option<bool>,
    pub injection_probability: Option<f64>,
    pub database_delay_ms: Option<u64>,
    pub cache_delay_ms: Option<u64>,
    pub external_delay_ms: Option<u64>,
}

// ============================================================================
// Service configuration
// ============================================================================

/// Rate limiter settings for a protected endpoint.
#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    pub capacity: u64,
    pub refill_interval: Duration,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            capacity: constants::DEFAULT_RATE_LIMIT_CAPACITY,
            refill_interval: constants::DEFAULT_RATE_LIMIT_REFILL_INTERVAL,
        }
    }
}

/// Circuit breaker settings for a protected dependency.
#[derive(Debug, Clone)]
pub struct BreakerSettings {
    pub max_failures: u64,
    pub open_timeout: Duration,
    pub half_open_success_threshold: u64,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            max_failures: constants::DEFAULT_BREAKER_MAX_FAILURES,
            open_timeout: constants::DEFAULT_BREAKER_OPEN_TIMEOUT,
            half_open_success_threshold: constants::DEFAULT_BREAKER_SUCCESS_THRESHOLD,
        }
    }
}

/// Initial lag controller settings loaded at startup.
#[derive(Debug, Clone)]
pub struct LagSettingsInit {
    pub enabled: bool,
    pub injection_probability: f64,
    pub database_delay: Duration,
    pub cache_delay: Duration,
    pub external_delay: Duration,
}

impl Default for LagSettingsInit {
    fn default() -> Self {
        Self {
            enabled: false,
            injection_probability: constants::DEFAULT_LAG_PROBABILITY,
            database_delay: constants::DEFAULT_LAG_DATABASE_DELAY,
            cache_delay: constants::DEFAULT_LAG_CACHE_DELAY,
            external_delay: constants::DEFAULT_LAG_EXTERNAL_DELAY,
        }
    }
}

/// Full configuration for the payment service.
#[derive(Debug, Clone)]
pub struct PaymentServiceConfig {
    pub listen_addr: String,
    /// Base URL of the antifraud service; `None` keeps events in-process.
    pub antifraud_url: Option<String>,
    pub rate_limit: RateLimitSettings,
    pub breaker: BreakerSettings,
    pub lag: LagSettingsInit,
}

impl Default for PaymentServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: constants::DEFAULT_PAYMENT_LISTEN_ADDR.to_string(),
            antifraud_url: None,
            rate_limit: RateLimitSettings::default(),
            breaker: BreakerSettings::default(),
            lag: LagSettingsInit::default(),
        }
    }
}

/// Full configuration for the antifraud service.
#[derive(Debug, Clone)]
pub struct AntifraudServiceConfig {
    pub listen_addr: String,
}

impl Default for AntifraudServiceConfig {
    fn default() -> Self {
        Self { listen_addr: constants::DEFAULT_ANTIFRAUD_LISTEN_ADDR.to_string() }
    }
}
