//! Circuit breaker with an explicit tagged state machine
//!
//! Guards a call to one risky dependency. After `max_failures` consecutive
//! failures the circuit opens and calls are rejected without touching the
//! dependency; once `open_timeout` elapses the next call probes in
//! half-open, and `half_open_success_threshold` consecutive successes close
//! the circuit again.
//!
//! ## Design
//! - State is a single tagged variant (`Closed { failures }`,
//!   `Open { since }`, `HalfOpen { successes }`) behind one mutex, so two
//!   callers can never race into inconsistent double transitions.
//! - Transitions are pure functions of (state, outcome, now); the probe
//!   itself always runs outside the lock.
//! - The probe's own error is surfaced verbatim as a source; the breaker
//!   adds only the distinct "circuit open, rejected without attempt" error.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::{ConfigError, ConfigResult};

/// Errors produced by a guarded call.
///
/// Generic over the probe's own error type `E` so the original failure is
/// preserved and distinguishable from a breaker rejection.
#[derive(Debug, Error)]
pub enum ResilienceError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// The circuit is open; the probe was not invoked.
    #[error("circuit breaker is open, call rejected without attempt")]
    CircuitOpen,

    /// The probe itself failed; its error is the source.
    #[error("guarded operation failed")]
    OperationFailed {
        #[source]
        source: E,
    },
}

/// Result type for guarded calls.
pub type ResilienceResult<T, E> = Result<T, ResilienceError<E>>;

/// Circuit breaker state with per-state bookkeeping.
///
/// The three variants are mutually exclusive and exhaustive; counters live
/// inside the variant they belong to, so stale counts cannot leak across
/// transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Requests flow; consecutive failures are counted.
    Closed { failures: u64 },
    /// Requests are rejected until the open timeout elapses.
    Open { since: Instant },
    /// Trial requests flow; consecutive successes are counted.
    HalfOpen { successes: u64 },
}

impl CircuitState {
    /// Discriminant without payload, for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CircuitState::Closed { .. } => "closed",
            CircuitState::Open { .. } => "open",
            CircuitState::HalfOpen { .. } => "half_open",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, CircuitState::Closed { .. })
    }

    pub fn is_open(&self) -> bool {
        matches!(self, CircuitState::Open { .. })
    }

    pub fn is_half_open(&self) -> bool {
        matches!(self, CircuitState::HalfOpen { .. })
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// Configuration for circuit breaker behavior.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that trip Closed -> Open.
    pub max_failures: u64,
    /// Time an open circuit waits before allowing a half-open probe.
    pub open_timeout: Duration,
    /// Consecutive half-open successes required to close.
    pub half_open_success_threshold: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            open_timeout: Duration::from_secs(30),
            half_open_success_threshold: 2,
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_failures == 0 {
            return Err(ConfigError::invalid("max_failures must be greater than 0"));
        }
        if self.half_open_success_threshold == 0 {
            return Err(ConfigError::invalid(
                "half_open_success_threshold must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Builder for [`CircuitBreakerConfig`].
#[derive(Debug, Default)]
pub struct CircuitBreakerConfigBuilder {
    config: CircuitBreakerConfig,
}

impl CircuitBreakerConfigBuilder {
    pub fn new() -> Self {
        Self { config: CircuitBreakerConfig::default() }
    }

    pub fn max_failures(mut self, threshold: u64) -> Self {
        self.config.max_failures = threshold;
        self
    }

    pub fn open_timeout(mut self, timeout: Duration) -> Self {
        self.config.open_timeout = timeout;
        self
    }

    pub fn half_open_success_threshold(mut self, threshold: u64) -> Self {
        self.config.half_open_success_threshold = threshold;
        self
    }

    pub fn build(self) -> ConfigResult<CircuitBreakerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Admission decision taken before running a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Proceed,
    Reject,
}

/// Per-dependency circuit breaker.
///
/// One long-lived instance guards one dependency; clones share state.
///
/// # Examples
///
/// ```rust
/// use loadlab_common::resilience::CircuitBreaker;
///
/// let breaker = CircuitBreaker::with_defaults();
///
/// let result = breaker.call(|| Ok::<_, std::io::Error>("reply"));
/// assert!(result.is_ok());
/// ```
pub struct CircuitBreaker<C: Clock = SystemClock> {
    config: CircuitBreakerConfig,
    state: Arc<Mutex<CircuitState>>,
    clock: Arc<C>,
}

impl CircuitBreaker<SystemClock> {
    /// Create a breaker with the given configuration and the system clock.
    pub fn new(config: CircuitBreakerConfig) -> ConfigResult<Self> {
        Self::with_clock(config, SystemClock)
    }

    /// Create a breaker with default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: CircuitBreakerConfig::default(),
            state: Arc::new(Mutex::new(CircuitState::Closed { failures: 0 })),
            clock: Arc::new(SystemClock),
        }
    }
}

impl<C: Clock> CircuitBreaker<C> {
    /// Create a breaker with a custom clock (useful for testing).
    pub fn with_clock(config: CircuitBreakerConfig, clock: C) -> ConfigResult<Self> {
        config.validate()?;

        Ok(Self {
            config,
            state: Arc::new(Mutex::new(CircuitState::Closed { failures: 0 })),
            clock: Arc::new(clock),
        })
    }

    /// Run a synchronous probe under circuit protection.
    ///
    /// Rejects with [`ResilienceError::CircuitOpen`] while the circuit is
    /// open and the timeout has not elapsed; otherwise invokes the probe and
    /// records its outcome.
    pub fn call<F, T, E>(&self, probe: F) -> ResilienceResult<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: std::error::Error + Send + Sync + 'static,
    {
        if self.admit() == Admission::Reject {
            debug!(state = %self.state(), "circuit breaker rejecting call");
            return Err(ResilienceError::CircuitOpen);
        }

        match probe() {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(error) => {
                self.on_failure();
                Err(ResilienceError::OperationFailed { source: error })
            }
        }
    }

    /// Run an asynchronous probe under circuit protection.
    ///
    /// The state mutex is never held across the `await`; only the admission
    /// decision and the outcome recording take the lock.
    pub async fn execute<F, Fut, T, E>(&self, probe: F) -> ResilienceResult<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        if self.admit() == Admission::Reject {
            debug!(state = %self.state(), "circuit breaker rejecting call");
            return Err(ResilienceError::CircuitOpen);
        }

        match probe().await {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(error) => {
                self.on_failure();
                Err(ResilienceError::OperationFailed { source: error })
            }
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> CircuitState {
        match self.state.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn!("circuit breaker state lock poisoned");
                *poisoned.into_inner()
            }
        }
    }

    /// Decide admission for the current call, applying the Open -> HalfOpen
    /// timeout transition when due. Runs entirely under the state lock.
    fn admit(&self) -> Admission {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("circuit breaker state lock poisoned");
                poisoned.into_inner()
            }
        };

        let (next, admission) = admit_transition(*state, self.clock.now(), &self.config);
        if next != *state {
            debug!(from = %*state, to = %next, "circuit breaker transition");
            *state = next;
        }
        admission
    }

    /// Record a successful probe outcome.
    fn on_success(&self) {
        self.apply(|state, _now, config| success_transition(state, config));
    }

    /// Record a failed probe outcome.
    fn on_failure(&self) {
        self.apply(failure_transition);
    }

    fn apply<F>(&self, transition: F)
    where
        F: FnOnce(CircuitState, Instant, &CircuitBreakerConfig) -> CircuitState,
    {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("circuit breaker state lock poisoned");
                poisoned.into_inner()
            }
        };

        let next = transition(*state, self.clock.now(), &self.config);
        if next != *state {
            if next.is_open() {
                warn!(from = %*state, "circuit breaker opened");
            } else {
                debug!(from = %*state, to = %next, "circuit breaker transition");
            }
            *state = next;
        }
    }
}

/// Admission transition: pure function of (state, now, config).
///
/// Only the Open variant can change here; an open circuit whose timeout has
/// elapsed moves to half-open and the current call becomes the trial probe.
fn admit_transition(
    state: CircuitState,
    now: Instant,
    config: &CircuitBreakerConfig,
) -> (CircuitState, Admission) {
    match state {
        CircuitState::Closed { .. } | CircuitState::HalfOpen { .. } => (state, Admission::Proceed),
        CircuitState::Open { since } => {
            if now.duration_since(since) >= config.open_timeout {
                (CircuitState::HalfOpen { successes: 0 }, Admission::Proceed)
            } else {
                (state, Admission::Reject)
            }
        }
    }
}

/// Success transition: pure function of (state, config).
fn success_transition(state: CircuitState, config: &CircuitBreakerConfig) -> CircuitState {
    match state {
        CircuitState::Closed { .. } => CircuitState::Closed { failures: 0 },
        CircuitState::HalfOpen { successes } => {
            let successes = successes + 1;
            if successes >= config.half_open_success_threshold {
                CircuitState::Closed { failures: 0 }
            } else {
                CircuitState::HalfOpen { successes }
            }
        }
        // A success can only be reported by a probe that was admitted, so
        // this arm is unreachable in practice; keep the state unchanged.
        CircuitState::Open { .. } => state,
    }
}

/// Failure transition: pure function of (state, now, config).
fn failure_transition(
    state: CircuitState,
    now: Instant,
    config: &CircuitBreakerConfig,
) -> CircuitState {
    match state {
        CircuitState::Closed { failures } => {
            let failures = failures + 1;
            if failures >= config.max_failures {
                CircuitState::Open { since: now }
            } else {
                CircuitState::Closed { failures }
            }
        }
        // Any half-open failure reopens immediately.
        CircuitState::HalfOpen { .. } => CircuitState::Open { since: now },
        CircuitState::Open { .. } => state,
    }
}

impl<C: Clock> Clone for CircuitBreaker<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            state: Arc::clone(&self.state),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C: Clock> fmt::Debug for CircuitBreaker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::resilience::MockClock;

    fn io_failure() -> std::io::Error {
        std::io::Error::other("dependency failure")
    }

    fn breaker_with(
        clock: &MockClock,
        max_failures: u64,
        open_timeout: Duration,
        half_open_success_threshold: u64,
    ) -> CircuitBreaker<MockClock> {
        let config = CircuitBreakerConfig {
            max_failures,
            open_timeout,
            half_open_success_threshold,
        };
        CircuitBreaker::with_clock(config, clock.clone()).unwrap()
    }

    #[test]
    fn starts_closed_with_zero_failures() {
        let breaker = CircuitBreaker::with_defaults();
        assert_eq!(breaker.state(), CircuitState::Closed { failures: 0 });
    }

    #[test]
    fn config_validation_rejects_zero_thresholds() {
        assert!(CircuitBreakerConfig::builder().max_failures(0).build().is_err());
        assert!(CircuitBreakerConfig::builder().half_open_success_threshold(0).build().is_err());
        assert!(CircuitBreakerConfig::builder()
            .max_failures(3)
            .open_timeout(Duration::from_millis(100))
            .half_open_success_threshold(1)
            .build()
            .is_ok());
    }

    #[test]
    fn success_resets_failure_count_while_closed() {
        let clock = MockClock::new();
        let breaker = breaker_with(&clock, 3, Duration::from_secs(30), 2);

        let _ = breaker.call(|| Err::<(), _>(io_failure()));
        let _ = breaker.call(|| Err::<(), _>(io_failure()));
        assert_eq!(breaker.state(), CircuitState::Closed { failures: 2 });

        let _ = breaker.call(|| Ok::<_, std::io::Error>(()));
        assert_eq!(breaker.state(), CircuitState::Closed { failures: 0 });
    }

    #[test]
    fn trips_open_at_max_failures_and_rejects_without_probing() {
        let clock = MockClock::new();
        let breaker = breaker_with(&clock, 3, Duration::from_secs(30), 2);

        for _ in 0..3 {
            let _ = breaker.call(|| Err::<(), _>(io_failure()));
        }
        assert!(breaker.state().is_open());

        // Fourth call, before the timeout: the probe must not run.
        let probed = AtomicU32::new(0);
        let result = breaker.call(|| {
            probed.fetch_add(1, Ordering::SeqCst);
            Ok::<_, std::io::Error>(())
        });
        assert!(matches!(result, Err(ResilienceError::CircuitOpen)));
        assert_eq!(probed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn probe_error_is_surfaced_verbatim() {
        let breaker = CircuitBreaker::with_defaults();

        let result = breaker.call(|| Err::<(), _>(io_failure()));
        match result {
            Err(ResilienceError::OperationFailed { source }) => {
                assert_eq!(source.to_string(), "dependency failure");
            }
            other => panic!("expected OperationFailed, got {other:?}"),
        }
    }

    #[test]
    fn open_timeout_elapsed_probes_in_half_open() {
        let clock = MockClock::new();
        let breaker = breaker_with(&clock, 1, Duration::from_millis(100), 2);

        let _ = breaker.call(|| Err::<(), _>(io_failure()));
        assert!(breaker.state().is_open());

        // Before the timeout: still rejecting.
        clock.advance_millis(50);
        let result = breaker.call(|| Ok::<_, std::io::Error>(()));
        assert!(matches!(result, Err(ResilienceError::CircuitOpen)));

        // After the timeout: this same call is the half-open trial.
        clock.advance_millis(60);
        let result = breaker.call(|| Ok::<_, std::io::Error>(()));
        assert!(result.is_ok());
        assert_eq!(breaker.state(), CircuitState::HalfOpen { successes: 1 });
    }

    #[test]
    fn half_open_closes_after_success_threshold() {
        let clock = MockClock::new();
        let breaker = breaker_with(&clock, 1, Duration::from_millis(100), 2);

        let _ = breaker.call(|| Err::<(), _>(io_failure()));
        clock.advance_millis(150);

        assert!(breaker.call(|| Ok::<_, std::io::Error>(())).is_ok());
        assert_eq!(breaker.state(), CircuitState::HalfOpen { successes: 1 });

        assert!(breaker.call(|| Ok::<_, std::io::Error>(())).is_ok());
        assert_eq!(breaker.state(), CircuitState::Closed { failures: 0 });
    }

    #[test]
    fn half_open_failure_reopens_immediately() {
        let clock = MockClock::new();
        let breaker = breaker_with(&clock, 1, Duration::from_millis(100), 2);

        let _ = breaker.call(|| Err::<(), _>(io_failure()));
        clock.advance_millis(150);

        let result = breaker.call(|| Err::<(), _>(io_failure()));
        assert!(matches!(result, Err(ResilienceError::OperationFailed { .. })));
        assert!(breaker.state().is_open());

        // And the reopened circuit rejects again until the fresh timeout.
        let result = breaker.call(|| Ok::<_, std::io::Error>(()));
        assert!(matches!(result, Err(ResilienceError::CircuitOpen)));
    }

    #[test]
    fn end_to_end_recovery_scenario() {
        // max_failures=2, timeout=100ms, threshold=1: two failures open the
        // circuit, a call within 100ms is rejected unprobed, and a
        // succeeding call after 150ms closes it through half-open.
        let clock = MockClock::new();
        let breaker = breaker_with(&clock, 2, Duration::from_millis(100), 1);

        let _ = breaker.call(|| Err::<(), _>(io_failure()));
        let _ = breaker.call(|| Err::<(), _>(io_failure()));
        assert!(breaker.state().is_open());

        clock.advance_millis(50);
        assert!(matches!(
            breaker.call(|| Ok::<_, std::io::Error>(())),
            Err(ResilienceError::CircuitOpen)
        ));

        clock.advance_millis(100);
        assert!(breaker.call(|| Ok::<_, std::io::Error>(())).is_ok());
        assert_eq!(breaker.state(), CircuitState::Closed { failures: 0 });
    }

    #[tokio::test]
    async fn async_execute_success_and_rejection() {
        let clock = MockClock::new();
        let breaker = breaker_with(&clock, 1, Duration::from_secs(30), 1);

        let result = breaker.execute(|| async { Ok::<_, std::io::Error>(7) }).await;
        assert_eq!(result.unwrap(), 7);

        let _ = breaker.execute(|| async { Err::<(), _>(io_failure()) }).await;
        assert!(breaker.state().is_open());

        let result = breaker.execute(|| async { Ok::<_, std::io::Error>(7) }).await;
        assert!(matches!(result, Err(ResilienceError::CircuitOpen)));
    }

    #[tokio::test]
    async fn concurrent_failures_settle_into_a_single_open_state() {
        let clock = MockClock::new();
        let breaker = Arc::new(breaker_with(&clock, 5, Duration::from_secs(30), 1));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let breaker = Arc::clone(&breaker);
            handles.push(tokio::spawn(async move {
                let _ = breaker.execute(|| async { Err::<(), _>(io_failure()) }).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(breaker.state().is_open());
    }

    #[test]
    fn clones_share_state() {
        let clock = MockClock::new();
        let breaker = breaker_with(&clock, 1, Duration::from_secs(30), 1);
        let other = breaker.clone();

        let _ = breaker.call(|| Err::<(), _>(io_failure()));
        assert!(other.state().is_open());
    }
}
