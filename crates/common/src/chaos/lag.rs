//! Lag controller: reproducible latency injection
//!
//! A single process-wide instance is constructed at startup and passed
//! explicitly (by `Arc`) to every call site; there is no ambient global.
//! When enabled, each call site independently samples whether to replace its
//! organic latency model with the fixed delay configured for its dependency
//! class. There is no shared "this request is lagged" flag: cache, database
//! and external calls within one request each decide on their own.
//!
//! ## Concurrency
//! All fields live behind one `RwLock`, read on every in-flight request and
//! written only on administrative reconfiguration. A reader always sees a
//! complete settings snapshot from some single writer, never a torn mix.

use std::fmt;
use std::sync::RwLock;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Dependency classes that can receive injected lag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyClass {
    Database,
    Cache,
    External,
}

impl DependencyClass {
    /// All classes, in a stable order.
    pub const ALL: [DependencyClass; 3] =
        [DependencyClass::Database, DependencyClass::Cache, DependencyClass::External];

    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyClass::Database => "database",
            DependencyClass::Cache => "cache",
            DependencyClass::External => "external",
        }
    }
}

impl fmt::Display for DependencyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Initial settings for a [`LagController`].
#[derive(Debug, Clone)]
pub struct LagControllerConfig {
    pub enabled: bool,
    /// Fraction of calls affected when enabled, clamped to `[0.0, 1.0]`.
    pub injection_probability: f64,
    pub database_delay: Duration,
    pub cache_delay: Duration,
    pub external_delay: Duration,
}

impl Default for LagControllerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            injection_probability: 1.0,
            database_delay: Duration::from_secs(2),
            cache_delay: Duration::from_millis(500),
            external_delay: Duration::from_secs(1),
        }
    }
}

/// Guarded settings; mutated only through the controller's setters.
#[derive(Debug, Clone)]
struct LagSettings {
    enabled: bool,
    injection_probability: f64,
    database_delay: Duration,
    cache_delay: Duration,
    external_delay: Duration,
}

/// Process-wide toggle for intentional, reproducible lag.
#[derive(Debug)]
pub struct LagController {
    settings: RwLock<LagSettings>,
}

impl Default for LagController {
    fn default() -> Self {
        Self::new(LagControllerConfig::default())
    }
}

impl LagController {
    /// Create a controller from initial settings.
    ///
    /// The injection probability is clamped into `[0.0, 1.0]`, as on every
    /// later write.
    pub fn new(config: LagControllerConfig) -> Self {
        Self {
            settings: RwLock::new(LagSettings {
                enabled: config.enabled,
                injection_probability: clamp_probability(config.injection_probability),
                database_delay: config.database_delay,
                cache_delay: config.cache_delay,
                external_delay: config.external_delay,
            }),
        }
    }

    /// Decide whether this call site should substitute its configured lag.
    ///
    /// Returns `false` immediately when disabled; otherwise draws one
    /// uniform sample in `[0, 1)` against the injection probability. Each
    /// invocation decides independently.
    pub fn should_apply_lag(&self) -> bool {
        let settings = self.read();
        if !settings.enabled {
            return false;
        }
        rand::thread_rng().gen::<f64>() < settings.injection_probability
    }

    pub fn is_enabled(&self) -> bool {
        self.read().enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.write(|settings| settings.enabled = enabled);
        info!(enabled, "lag injection toggled");
    }

    /// Effective injection probability (post-clamping).
    pub fn injection_probability(&self) -> f64 {
        self.read().injection_probability
    }

    /// Set the injection probability, clamping into `[0.0, 1.0]`.
    pub fn set_injection_probability(&self, probability: f64) {
        let clamped = clamp_probability(probability);
        self.write(|settings| settings.injection_probability = clamped);
    }

    /// Configured delay for a dependency class.
    pub fn delay(&self, class: DependencyClass) -> Duration {
        let settings = self.read();
        match class {
            DependencyClass::Database => settings.database_delay,
            DependencyClass::Cache => settings.cache_delay,
            DependencyClass::External => settings.external_delay,
        }
    }

    /// Set the delay for a dependency class.
    pub fn set_delay(&self, class: DependencyClass, delay: Duration) {
        self.write(|settings| match class {
            DependencyClass::Database => settings.database_delay = delay,
            DependencyClass::Cache => settings.cache_delay = delay,
            DependencyClass::External => settings.external_delay = delay,
        });
    }

    fn read(&self) -> LagSettings {
        match self.settings.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => {
                warn!("lag controller settings lock poisoned");
                poisoned.into_inner().clone()
            }
        }
    }

    fn write<F: FnOnce(&mut LagSettings)>(&self, mutate: F) {
        match self.settings.write() {
            Ok(mut guard) => mutate(&mut guard),
            Err(poisoned) => {
                warn!("lag controller settings lock poisoned");
                mutate(&mut poisoned.into_inner());
            }
        }
    }
}

/// NaN maps to 0.0; anything outside `[0.0, 1.0]` is pulled to the nearer
/// bound.
fn clamp_probability(probability: f64) -> f64 {
    if probability.is_nan() {
        return 0.0;
    }
    probability.clamp(0.0, 1.0)
}
