//! Domain constants
//!
//! Centralized defaults and environment variable names. The simulation
//! constants mirror the traffic shape the generator is meant to produce:
//! mostly-fast dependencies with a small long-tail fraction.

use std::time::Duration;

// Lag controller defaults (used when the environment provides nothing)
pub const DEFAULT_LAG_DATABASE_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_LAG_CACHE_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_LAG_EXTERNAL_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_LAG_PROBABILITY: f64 = 1.0;

// Rate limiter defaults
pub const DEFAULT_RATE_LIMIT_CAPACITY: u64 = 100;
pub const DEFAULT_RATE_LIMIT_REFILL_INTERVAL: Duration = Duration::from_secs(1);

// Circuit breaker defaults
pub const DEFAULT_BREAKER_MAX_FAILURES: u64 = 5;
pub const DEFAULT_BREAKER_OPEN_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_BREAKER_SUCCESS_THRESHOLD: u64 = 2;

// Latency simulation shape
pub const DATABASE_BASE_DELAY: Duration = Duration::from_millis(10);
pub const DATABASE_TAIL_PROBABILITY: f64 = 0.01;
pub const DATABASE_TAIL_MAX_EXTRA_MS: u64 = 2_000;
pub const CACHE_HIT_PROBABILITY: f64 = 0.8;
pub const CACHE_MISS_PENALTY: Duration = Duration::from_millis(50);
pub const EXTERNAL_CALL_COUNT: u32 = 3;
pub const EXTERNAL_CALL_DELAY: Duration = Duration::from_millis(5);
pub const EXTERNAL_FAILURE_PROBABILITY: f64 = 0.05;

// Antifraud scoring shape
pub const SCORING_BASE_DELAY: Duration = Duration::from_millis(50);
pub const SCORING_JITTER_MAX_MS: u64 = 100;
pub const SCORING_TAIL_PROBABILITY: f64 = 0.01;
pub const SCORING_TAIL_EXTRA: Duration = Duration::from_millis(500);
pub const RISK_SCORE_MAX: f64 = 100.0;
pub const FRAUD_SCORE_THRESHOLD: f64 = 80.0;

// Service defaults
pub const DEFAULT_PAYMENT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_ANTIFRAUD_LISTEN_ADDR: &str = "0.0.0.0:8081";

// Environment variable names
pub const ENV_LAG_ENABLED: &str = "LOADLAB_LAG_ENABLED";
pub const ENV_LAG_DATABASE_MS: &str = "LOADLAB_LAG_DATABASE_MS";
pub const ENV_LAG_CACHE_MS: &str = "LOADLAB_LAG_CACHE_MS";
pub const ENV_LAG_EXTERNAL_MS: &str = "LOADLAB_LAG_EXTERNAL_MS";
pub const ENV_LAG_PROBABILITY: &str = "LOADLAB_LAG_PROBABILITY";
pub const ENV_RATE_LIMIT_CAPACITY: &str = "LOADLAB_RATE_LIMIT_CAPACITY";
pub const ENV_RATE_LIMIT_REFILL_MS: &str = "LOADLAB_RATE_LIMIT_REFILL_MS";
pub const ENV_BREAKER_MAX_FAILURES: &str = "LOADLAB_BREAKER_MAX_FAILURES";
pub const ENV_BREAKER_OPEN_TIMEOUT_MS: &str = "LOADLAB_BREAKER_OPEN_TIMEOUT_MS";
pub const ENV_BREAKER_SUCCESS_THRESHOLD: &str = "LOADLAB_BREAKER_SUCCESS_THRESHOLD";
pub const ENV_PAYMENT_LISTEN_ADDR: &str = "LOADLAB_PAYMENT_LISTEN_ADDR";
pub const ENV_ANTIFRAUD_LISTEN_ADDR: &str = "LOADLAB_ANTIFRAUD_LISTEN_ADDR";
pub const ENV_ANTIFRAUD_URL: &str = "LOADLAB_ANTIFRAUD_URL";

// Correlation propagation
pub const CORRELATION_HEADER: &str = "X-Correlation-ID";
