//! Event transports behind the pipeline's publishing seam
//!
//! Two transports implement [`EventPublisher`]: an in-process broadcast bus
//! used when both services run in one process (and by default when no peer
//! is configured), and an HTTP publisher that delivers events to a remote
//! antifraud service.

pub mod http;

use async_trait::async_trait;
use loadlab_core::EventPublisher;
use loadlab_domain::{PaymentEvent, Result};
use tokio::sync::broadcast;
use tracing::debug;

pub use http::HttpEventPublisher;

/// In-process fan-out bus backed by a tokio broadcast channel.
///
/// Publishing never fails; an event sent while no consumer is subscribed is
/// dropped, which matches the best-effort contract of the pipeline.
#[derive(Debug, Clone)]
pub struct BroadcastBus {
    sender: broadcast::Sender<PaymentEvent>,
}

impl BroadcastBus {
    /// Create a bus that buffers up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<PaymentEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl EventPublisher for BroadcastBus {
    async fn publish(&self, event: &PaymentEvent) -> Result<()> {
        if self.sender.send(event.clone()).is_err() {
            debug!(payment_id = %event.payment_id, "no subscribers, event dropped");
        }
        Ok(())
    }
}
