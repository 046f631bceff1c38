//! Resilience primitives for admission control and failure isolation
//!
//! Two gates shape every request the pipeline handles:
//! - **Rate limiter**: lazy token bucket, one instance per protected
//!   endpoint. Rejection is backpressure, not an error inside the limiter.
//! - **Circuit breaker**: per-dependency failure gate with an explicit
//!   `Closed | Open | HalfOpen` state machine.
//!
//! Both are generic over a [`Clock`] so timeout and refill behavior is
//! testable without real delays. Neither primitive blocks or retries; retry
//! policy belongs to the caller.

pub mod circuit_breaker;
pub mod clock;
pub mod rate_limiter;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerConfigBuilder, CircuitState,
    ResilienceError, ResilienceResult,
};
pub use clock::{Clock, MockClock, SystemClock};
pub use rate_limiter::{RateLimiter, RateLimiterConfig, RateLimiterConfigBuilder};

use thiserror::Error;

/// Validation error for resilience configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid { message: message.into() }
    }
}

/// Result type for configuration validation.
pub type ConfigResult<T> = Result<T, ConfigError>;
