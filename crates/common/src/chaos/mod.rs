//! Chaos-injection primitives
//!
//! Controlled degradation for exercising observability pipelines: the
//! [`LagController`] substitutes fixed, configured delays for organic
//! latency on a sampled fraction of dependency calls.

pub mod lag;

pub use lag::{DependencyClass, LagController, LagControllerConfig};
