//! Payment request pipeline
//!
//! One pipeline instance serves the whole process. Its rate limiter and
//! circuit breaker are built once, at startup, and shared across requests:
//! admission state that resets on every request would never reject anything
//! and never trip, so per-request construction is treated as a bug here.
//!
//! Per-request flow:
//! 1. `RateLimiter::allow` — backpressure; rejected requests do no work.
//! 2. `CircuitBreaker::execute` around the external dependency probe —
//!    circuit-open and probe failure both surface as unavailability.
//! 3. Simulated cache, database and chatty external calls, each consulting
//!    the shared lag controller.
//! 4. Response assembly and best-effort event publish.

use std::sync::Arc;

use loadlab_common::chaos::{DependencyClass, LagController};
use loadlab_common::resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, Clock, RateLimiter, RateLimiterConfig,
    ResilienceError, SystemClock,
};
use loadlab_domain::constants;
use loadlab_domain::{
    new_payment_id, BreakerSettings, PaymentEvent, PaymentRequest, PaymentResponse, PaymentStatus,
    RateLimitSettings,
};
use rand::Rng;
use thiserror::Error;
use tracing::{info, warn};

use crate::events::EventPublisher;
use crate::simulation::DependencySimulator;

/// Rejection reasons surfaced to the HTTP layer.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Backpressure: the rate limiter had no token for this request.
    #[error("rate limit exceeded")]
    RateLimited,

    /// The circuit is open; the dependency was not attempted.
    #[error("circuit breaker is open")]
    CircuitOpen,

    /// The guarded dependency probe itself failed.
    #[error("external dependency failed: {0}")]
    DependencyFailed(String),
}

/// Simulated failure returned by the external dependency probe.
#[derive(Debug, Error)]
#[error("external service error")]
struct ProbeError;

/// Everything the HTTP layer needs to answer and account for one processed
/// payment.
#[derive(Debug, Clone)]
pub struct ProcessedPayment {
    pub response: PaymentResponse,
    pub event: PaymentEvent,
    pub cache_hit: bool,
    /// Dependency classes that received injected lag during this request.
    pub lag_injections: Vec<DependencyClass>,
}

/// Long-lived pipeline shared by all in-flight requests.
pub struct PaymentPipeline<C: Clock = SystemClock> {
    limiter: RateLimiter<C>,
    breaker: CircuitBreaker<C>,
    simulator: DependencySimulator,
    publisher: Arc<dyn EventPublisher>,
    /// Probability that the guarded external probe fails.
    probe_failure_probability: f64,
}

impl PaymentPipeline<SystemClock> {
    /// Build a pipeline with the system clock.
    pub fn new(
        rate_limit: &RateLimitSettings,
        breaker: &BreakerSettings,
        lag: Arc<LagController>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Result<Self, loadlab_common::resilience::ConfigError> {
        Self::with_clock(rate_limit, breaker, lag, publisher, SystemClock)
    }
}

impl<C: Clock + Clone> PaymentPipeline<C> {
    /// Build a pipeline with a custom clock (useful for testing).
    pub fn with_clock(
        rate_limit: &RateLimitSettings,
        breaker: &BreakerSettings,
        lag: Arc<LagController>,
        publisher: Arc<dyn EventPublisher>,
        clock: C,
    ) -> Result<Self, loadlab_common::resilience::ConfigError> {
        let limiter_config = RateLimiterConfig {
            capacity: rate_limit.capacity,
            refill_interval: rate_limit.refill_interval,
        };
        let breaker_config = CircuitBreakerConfig {
            max_failures: breaker.max_failures,
            open_timeout: breaker.open_timeout,
            half_open_success_threshold: breaker.half_open_success_threshold,
        };

        Ok(Self {
            limiter: RateLimiter::with_clock(limiter_config, clock.clone())?,
            breaker: CircuitBreaker::with_clock(breaker_config, clock)?,
            simulator: DependencySimulator::new(lag),
            publisher,
            probe_failure_probability: constants::EXTERNAL_FAILURE_PROBABILITY,
        })
    }

    /// Override the probe failure probability (tests drive this to 0 or 1).
    pub fn with_probe_failure_probability(mut self, probability: f64) -> Self {
        self.probe_failure_probability = probability.clamp(0.0, 1.0);
        self
    }

    /// Current breaker state, for the metrics endpoint.
    pub fn breaker_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Tokens left in the admission bucket, for the metrics endpoint.
    pub fn available_tokens(&self) -> u64 {
        self.limiter.available_tokens()
    }

    /// Process one payment request end to end.
    pub async fn process(
        &self,
        request: PaymentRequest,
        correlation_id: &str,
    ) -> Result<ProcessedPayment, PipelineError> {
        if !self.limiter.allow() {
            warn!(correlation_id, "rate limit exceeded");
            return Err(PipelineError::RateLimited);
        }

        let failure_probability = self.probe_failure_probability;
        let guarded = self
            .breaker
            .execute(|| async move {
                if rand::thread_rng().gen::<f64>() < failure_probability {
                    Err(ProbeError)
                } else {
                    Ok(())
                }
            })
            .await;

        match guarded {
            Ok(()) => {}
            Err(ResilienceError::CircuitOpen) => {
                warn!(correlation_id, "circuit open, rejecting without attempt");
                return Err(PipelineError::CircuitOpen);
            }
            Err(ResilienceError::OperationFailed { source }) => {
                warn!(correlation_id, error = %source, "dependency probe failed");
                return Err(PipelineError::DependencyFailed(source.to_string()));
            }
        }

        let mut lag_injections = Vec::new();

        let lookup = self.simulator.cache_lookup().await;
        if lookup.lag_injected {
            lag_injections.push(DependencyClass::Cache);
        }

        if self.simulator.database_query().await.lag_injected {
            lag_injections.push(DependencyClass::Database);
        }

        // The external dependency is chatty: several round trips per request.
        for _ in 0..constants::EXTERNAL_CALL_COUNT {
            if self.simulator.external_call().await.lag_injected {
                lag_injections.push(DependencyClass::External);
            }
        }

        let payment_id = new_payment_id();
        let response = PaymentResponse {
            payment_id: payment_id.clone(),
            status: PaymentStatus::Processed,
            processed_at: chrono::Utc::now(),
        };
        let event = PaymentEvent::payment_created(&payment_id, &request, correlation_id);

        // Publishing is best-effort: a consumer outage must not fail payments.
        if let Err(error) = self.publisher.publish(&event).await {
            warn!(correlation_id, %error, "event publish failed");
        }

        info!(
            %payment_id,
            account_id = %request.account_id,
            amount = request.amount,
            currency = %request.currency,
            correlation_id,
            "payment processed"
        );

        Ok(ProcessedPayment { response, event, cache_hit: lookup.hit, lag_injections })
    }
}

impl<C: Clock> std::fmt::Debug for PaymentPipeline<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentPipeline")
            .field("breaker_state", &self.breaker.state())
            .finish_non_exhaustive()
    }
}
