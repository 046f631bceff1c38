//! Configuration loader
//!
//! All configuration comes from `LOADLAB_*` environment variables; every
//! variable has a default, so both services start with no environment at
//! all. A variable that is set but malformed is logged and ignored, keeping
//! the default, so a typo in a deployment manifest degrades the run instead
//! of killing it.
//!
//! ## Environment Variables
//! - `LOADLAB_PAYMENT_LISTEN_ADDR` / `LOADLAB_ANTIFRAUD_LISTEN_ADDR`
//! - `LOADLAB_ANTIFRAUD_URL`: base URL for event delivery; unset keeps
//!   events on the in-process bus
//! - `LOADLAB_RATE_LIMIT_CAPACITY`, `LOADLAB_RATE_LIMIT_REFILL_MS`
//! - `LOADLAB_BREAKER_MAX_FAILURES`, `LOADLAB_BREAKER_OPEN_TIMEOUT_MS`,
//!   `LOADLAB_BREAKER_SUCCESS_THRESHOLD`
//! - `LOADLAB_LAG_ENABLED` (true/false), `LOADLAB_LAG_PROBABILITY`,
//!   `LOADLAB_LAG_DATABASE_MS`, `LOADLAB_LAG_CACHE_MS`,
//!   `LOADLAB_LAG_EXTERNAL_MS`

use std::str::FromStr;
use std::time::Duration;

use loadlab_domain::{constants, AntifraudServiceConfig, PaymentServiceConfig};
use tracing::warn;

/// Load the payment service configuration from the environment.
pub fn load_payment_config() -> PaymentServiceConfig {
    let mut config = PaymentServiceConfig::default();

    if let Ok(addr) = std::env::var(constants::ENV_PAYMENT_LISTEN_ADDR) {
        config.listen_addr = addr;
    }
    config.antifraud_url = std::env::var(constants::ENV_ANTIFRAUD_URL).ok();

    env_parse(constants::ENV_RATE_LIMIT_CAPACITY, &mut config.rate_limit.capacity);
    env_duration_ms(constants::ENV_RATE_LIMIT_REFILL_MS, &mut config.rate_limit.refill_interval);

    env_parse(constants::ENV_BREAKER_MAX_FAILURES, &mut config.breaker.max_failures);
    env_duration_ms(constants::ENV_BREAKER_OPEN_TIMEOUT_MS, &mut config.breaker.open_timeout);
    env_parse(
        constants::ENV_BREAKER_SUCCESS_THRESHOLD,
        &mut config.breaker.half_open_success_threshold,
    );

    config.lag.enabled = env_bool(constants::ENV_LAG_ENABLED, config.lag.enabled);
    env_parse(constants::ENV_LAG_PROBABILITY, &mut config.lag.injection_probability);
    env_duration_ms(constants::ENV_LAG_DATABASE_MS, &mut config.lag.database_delay);
    env_duration_ms(constants::ENV_LAG_CACHE_MS, &mut config.lag.cache_delay);
    env_duration_ms(constants::ENV_LAG_EXTERNAL_MS, &mut config.lag.external_delay);

    config
}

/// Load the antifraud service configuration from the environment.
pub fn load_antifraud_config() -> AntifraudServiceConfig {
    let mut config = AntifraudServiceConfig::default();

    if let Ok(addr) = std::env::var(constants::ENV_ANTIFRAUD_LISTEN_ADDR) {
        config.listen_addr = addr;
    }

    config
}

/// Overwrite `target` with a parsed environment value when present and valid.
fn env_parse<T: FromStr>(key: &str, target: &mut T) {
    if let Ok(raw) = std::env::var(key) {
        match raw.parse::<T>() {
            Ok(value) => *target = value,
            Err(_) => warn!(key, value = %raw, "ignoring malformed environment value"),
        }
    }
}

/// Overwrite `target` with a millisecond duration from the environment.
fn env_duration_ms(key: &str, target: &mut Duration) {
    let mut millis = target.as_millis() as u64;
    env_parse(key, &mut millis);
    *target = Duration::from_millis(millis);
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
