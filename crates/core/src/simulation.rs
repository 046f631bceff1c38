//! Simulated dependency calls
//!
//! Each simulated dependency (cache, database, external) produces an
//! organic latency shape: mostly fast, with a small long-tail fraction.
//! Before running its organic model, every call consults the shared
//! [`LagController`]; when the controller says so, the call sleeps the
//! fixed configured delay for its class instead and reports that lag was
//! injected, so the caller can record it.
//!
//! The lag decision is made independently at each call site. One request
//! can see an injected database delay and an organic cache lookup.

use std::sync::Arc;
use std::time::Duration;

use loadlab_common::chaos::{DependencyClass, LagController};
use rand::Rng;
use tracing::{debug, warn};

use loadlab_domain::constants;

/// Result of one simulated cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLookup {
    pub hit: bool,
    pub lag_injected: bool,
}

/// Result of a simulated database or external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedCall {
    pub lag_injected: bool,
}

/// Latency models for the three dependency classes, all gated by the shared
/// lag controller.
#[derive(Clone)]
pub struct DependencySimulator {
    lag: Arc<LagController>,
}

impl DependencySimulator {
    pub fn new(lag: Arc<LagController>) -> Self {
        Self { lag }
    }

    /// Simulate a cache lookup: 80% hit; a miss costs the miss penalty.
    ///
    /// Injected lag stands in for a pathological miss, so the lookup
    /// reports `hit: false` when lag applies.
    pub async fn cache_lookup(&self) -> CacheLookup {
        if self.lag.should_apply_lag() {
            let delay = self.lag.delay(DependencyClass::Cache);
            self.inject(DependencyClass::Cache, delay).await;
            return CacheLookup { hit: false, lag_injected: true };
        }

        let hit = rand::thread_rng().gen::<f64>() < constants::CACHE_HIT_PROBABILITY;
        if !hit {
            tokio::time::sleep(constants::CACHE_MISS_PENALTY).await;
        }
        debug!(cache.hit = hit, "cache lookup");
        CacheLookup { hit, lag_injected: false }
    }

    /// Simulate a database query: fixed base delay with a 1% long tail.
    pub async fn database_query(&self) -> SimulatedCall {
        if self.lag.should_apply_lag() {
            let delay = self.lag.delay(DependencyClass::Database);
            self.inject(DependencyClass::Database, delay).await;
            return SimulatedCall { lag_injected: true };
        }

        let mut delay = constants::DATABASE_BASE_DELAY;
        if rand::thread_rng().gen::<f64>() < constants::DATABASE_TAIL_PROBABILITY {
            let extra = rand::thread_rng().gen_range(0..constants::DATABASE_TAIL_MAX_EXTRA_MS);
            delay += Duration::from_millis(extra);
            warn!(delay_ms = delay.as_millis() as u64, "slow query simulated");
        }
        tokio::time::sleep(delay).await;
        SimulatedCall { lag_injected: false }
    }

    /// Simulate one call of the chatty external dependency.
    pub async fn external_call(&self) -> SimulatedCall {
        if self.lag.should_apply_lag() {
            let delay = self.lag.delay(DependencyClass::External);
            self.inject(DependencyClass::External, delay).await;
            return SimulatedCall { lag_injected: true };
        }

        tokio::time::sleep(constants::EXTERNAL_CALL_DELAY).await;
        SimulatedCall { lag_injected: false }
    }

    async fn inject(&self, class: DependencyClass, delay: Duration) {
        warn!(
            lag.class = class.as_str(),
            lag.duration_ms = delay.as_millis() as u64,
            "substituting intentional lag"
        );
        tokio::time::sleep(delay).await;
    }
}

impl std::fmt::Debug for DependencySimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencySimulator").finish_non_exhaustive()
    }
}
