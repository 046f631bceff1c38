//! # LoadLab Infra
//!
//! Infrastructure concerns of the traffic generator: environment-driven
//! configuration, event transports behind the pipeline's publishing seam,
//! metrics registries, and tracing setup.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod bus;
pub mod config;
pub mod consumer;
pub mod observability;

pub use bus::{BroadcastBus, HttpEventPublisher};
pub use config::{load_antifraud_config, load_payment_config};
pub use consumer::spawn_scoring_consumer;
pub use observability::{init_tracing, AntifraudMetrics, PaymentMetrics};
