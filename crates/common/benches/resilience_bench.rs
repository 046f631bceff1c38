//! Benchmarks for the resilience primitives
//!
//! Covers the rate limiter admission hot path, breaker success/rejection
//! paths, and the lag controller sampling read.
//!
//! Run with: `cargo bench --bench resilience_bench -p loadlab-common`

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use loadlab_common::chaos::{LagController, LagControllerConfig};
use loadlab_common::resilience::{
    CircuitBreaker, CircuitBreakerConfig, RateLimiter, ResilienceError,
};

fn bench_rate_limiter(c: &mut Criterion) {
    let mut group = c.benchmark_group("rate_limiter");

    group.bench_function("allow_with_tokens", |b| {
        let limiter = RateLimiter::new(u64::MAX / 2, Duration::from_nanos(1))
            .expect("valid limiter config for benchmarks");
        b.iter(|| black_box(limiter.allow()));
    });

    group.bench_function("allow_exhausted", |b| {
        let limiter = RateLimiter::new(1, Duration::from_secs(3600))
            .expect("valid limiter config for benchmarks");
        let _ = limiter.allow();
        b.iter(|| black_box(limiter.allow()));
    });

    group.finish();
}

fn bench_circuit_breaker(c: &mut Criterion) {
    let mut group = c.benchmark_group("circuit_breaker");

    group.bench_function("call_success", |b| {
        let breaker = CircuitBreaker::with_defaults();
        b.iter(|| {
            let result: Result<_, ResilienceError<std::io::Error>> =
                breaker.call(|| Ok::<_, std::io::Error>(()));
            black_box(result)
        });
    });

    group.bench_function("open_short_circuit", |b| {
        let config = CircuitBreakerConfig {
            max_failures: 1,
            open_timeout: Duration::from_secs(3600),
            half_open_success_threshold: 1,
        };
        let breaker =
            CircuitBreaker::new(config).expect("valid breaker config for benchmarks");
        let _ = breaker.call(|| Err::<(), _>(std::io::Error::other("trip")));

        b.iter(|| {
            let result: Result<_, ResilienceError<std::io::Error>> =
                breaker.call(|| Ok::<_, std::io::Error>(()));
            black_box(result)
        });
    });

    group.finish();
}

fn bench_lag_controller(c: &mut Criterion) {
    let mut group = c.benchmark_group("lag_controller");

    group.bench_function("should_apply_lag_enabled", |b| {
        let controller = LagController::new(LagControllerConfig {
            enabled: true,
            injection_probability: 0.5,
            ..LagControllerConfig::default()
        });
        b.iter(|| black_box(controller.should_apply_lag()));
    });

    group.bench_function("should_apply_lag_disabled", |b| {
        let controller = LagController::default();
        b.iter(|| black_box(controller.should_apply_lag()));
    });

    group.finish();
}

criterion_group!(benches, bench_rate_limiter, bench_circuit_breaker, bench_lag_controller);
criterion_main!(benches);
