//! Generic resilience and chaos-injection primitives shared across LoadLab
//! crates.
//!
//! The modules here carry no domain knowledge: they gate and shape work
//! submitted by the request pipeline without knowing what that work is.
//!
//! - [`resilience`]: token-bucket admission control and a circuit breaker
//!   with an explicit state machine.
//! - [`chaos`]: the lag controller that substitutes fixed, configured delays
//!   for organic latency on a sampled fraction of calls.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod chaos;
pub mod resilience;

pub use chaos::{DependencyClass, LagController, LagControllerConfig};
pub use resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerConfigBuilder, CircuitState, Clock,
    ConfigError, ConfigResult, MockClock, RateLimiter, RateLimiterConfig,
    RateLimiterConfigBuilder, ResilienceError, ResilienceResult, SystemClock,
};
