//! Token-bucket admission control
//!
//! A lazy token bucket: refill is computed from elapsed wall-clock time on
//! every admission check, never by a background timer. One instance guards
//! one endpoint and lives for the process lifetime, so rejected bursts see
//! tokens return as time passes.
//!
//! ## Design
//! - The whole refill/check/decrement sequence runs under a single mutex so
//!   concurrent callers can never double-spend a token.
//! - A rejected call consumes nothing.
//! - `last_refill` advances to "now" rather than the theoretical interval
//!   boundary; the resulting drift is accepted.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::{ConfigError, ConfigResult};

/// Configuration for the token-bucket rate limiter.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of tokens the bucket can hold.
    pub capacity: u64,
    /// Time it takes to refill a single token.
    pub refill_interval: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self { capacity: 100, refill_interval: Duration::from_secs(1) }
    }
}

impl RateLimiterConfig {
    /// Create a new configuration builder.
    pub fn builder() -> RateLimiterConfigBuilder {
        RateLimiterConfigBuilder::new()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.capacity == 0 {
            return Err(ConfigError::invalid("capacity must be greater than 0"));
        }
        if self.refill_interval.is_zero() {
            return Err(ConfigError::invalid("refill_interval must be greater than zero"));
        }
        Ok(())
    }
}

/// Builder for [`RateLimiterConfig`].
#[derive(Debug, Default)]
pub struct RateLimiterConfigBuilder {
    config: RateLimiterConfig,
}

impl RateLimiterConfigBuilder {
    pub fn new() -> Self {
        Self { config: RateLimiterConfig::default() }
    }

    pub fn capacity(mut self, capacity: u64) -> Self {
        self.config.capacity = capacity;
        self
    }

    pub fn refill_interval(mut self, interval: Duration) -> Self {
        self.config.refill_interval = interval;
        self
    }

    pub fn build(self) -> ConfigResult<RateLimiterConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Mutable bucket state, guarded as a unit.
#[derive(Debug)]
struct Bucket {
    tokens: u64,
    last_refill: Instant,
}

/// Token-bucket rate limiter with lazy refill.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use loadlab_common::resilience::RateLimiter;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let limiter = RateLimiter::new(100, Duration::from_secs(1))?;
///
/// if limiter.allow() {
///     // proceed with the request
/// } else {
///     // surface backpressure to the caller
/// }
/// # Ok(())
/// # }
/// ```
pub struct RateLimiter<C: Clock = SystemClock> {
    config: RateLimiterConfig,
    bucket: Arc<Mutex<Bucket>>,
    clock: Arc<C>,
}

impl RateLimiter<SystemClock> {
    /// Create a limiter with the system clock, starting full.
    pub fn new(capacity: u64, refill_interval: Duration) -> ConfigResult<Self> {
        Self::with_clock(RateLimiterConfig { capacity, refill_interval }, SystemClock)
    }

    /// Create a limiter from a validated configuration.
    pub fn from_config(config: RateLimiterConfig) -> ConfigResult<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> RateLimiter<C> {
    /// Create a limiter with a custom clock (useful for testing).
    pub fn with_clock(config: RateLimiterConfig, clock: C) -> ConfigResult<Self> {
        config.validate()?;

        Ok(Self {
            bucket: Arc::new(Mutex::new(Bucket {
                tokens: config.capacity,
                last_refill: clock.now(),
            })),
            clock: Arc::new(clock),
            config,
        })
    }

    /// Decide whether one request may proceed.
    ///
    /// Refills any tokens owed by elapsed time, then spends one if
    /// available. Returns `false` without consuming anything when the
    /// bucket is empty. Never blocks beyond the internal mutex.
    pub fn allow(&self) -> bool {
        let mut bucket = self.lock_bucket();
        self.refill(&mut bucket);

        if bucket.tokens > 0 {
            bucket.tokens -= 1;
            true
        } else {
            debug!("rate limiter exhausted, rejecting");
            false
        }
    }

    /// Tokens currently available, after applying any pending refill.
    pub fn available_tokens(&self) -> u64 {
        let mut bucket = self.lock_bucket();
        self.refill(&mut bucket);
        bucket.tokens
    }

    /// Credit tokens owed by elapsed time: one per whole interval, capped at
    /// capacity, `last_refill` advanced to now (accepted drift).
    fn refill(&self, bucket: &mut Bucket) {
        let now = self.clock.now();
        let elapsed = now.duration_since(bucket.last_refill);
        let intervals = elapsed.as_nanos() / self.config.refill_interval.as_nanos().max(1);

        if intervals > 0 {
            let tokens_to_add = u64::try_from(intervals).unwrap_or(u64::MAX);
            bucket.tokens = bucket.tokens.saturating_add(tokens_to_add).min(self.config.capacity);
            bucket.last_refill = now;
            debug!(added = tokens_to_add, tokens = bucket.tokens, "refilled rate limiter");
        }
    }

    fn lock_bucket(&self) -> std::sync::MutexGuard<'_, Bucket> {
        match self.bucket.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("rate limiter bucket lock poisoned");
                poisoned.into_inner()
            }
        }
    }

    /// Maximum tokens the bucket can hold.
    pub fn capacity(&self) -> u64 {
        self.config.capacity
    }
}

impl<C: Clock> Clone for RateLimiter<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            bucket: Arc::clone(&self.bucket),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C: Clock> std::fmt::Debug for RateLimiter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").field("config", &self.config).finish()
    }
}
