//! Event publishing seam
//!
//! The pipeline publishes a `PaymentCreated` event after each processed
//! payment. The transport behind that publish (in-process bus, HTTP peer)
//! is an infra concern; the pipeline only sees this trait.

use async_trait::async_trait;
use loadlab_domain::{PaymentEvent, Result};

/// Outbound event transport used by the payment pipeline.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event. Errors are reported to the caller, which treats
    /// publishing as best-effort (a failed publish never fails the payment).
    async fn publish(&self, event: &PaymentEvent) -> Result<()>;
}

/// Publisher that drops every event.
///
/// Used when no downstream consumer is configured, and in benchmarks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPublisher;

#[async_trait]
impl EventPublisher for NullPublisher {
    async fn publish(&self, _event: &PaymentEvent) -> Result<()> {
        Ok(())
    }
}
