//! # LoadLab Core
//!
//! The request pipeline of the traffic generator: admission control, guarded
//! dependency probes, latency simulation, fraud scoring, and the event
//! publishing seam.
//!
//! This crate wires the generic primitives from `loadlab-common` to the
//! domain's request flow. It knows nothing about HTTP or transports; those
//! live in `loadlab-infra` and the service binaries.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod events;
pub mod fraud;
pub mod pipeline;
pub mod simulation;

pub use events::{EventPublisher, NullPublisher};
pub use fraud::FraudAnalyzer;
pub use pipeline::{PaymentPipeline, PipelineError, ProcessedPayment};
pub use simulation::DependencySimulator;
