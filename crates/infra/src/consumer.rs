//! In-process event consumer
//!
//! When no remote antifraud peer is configured, the payment binary still
//! completes the payment -> scoring flow: a background task subscribes to
//! the in-process bus and runs every published event through the fraud
//! analyzer. Without this task the bus would have no subscribers and every
//! event would be dropped on publish.

use std::sync::Arc;

use loadlab_core::FraudAnalyzer;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::bus::BroadcastBus;
use crate::observability::AntifraudMetrics;

/// Spawn a task that scores every event published on `bus`.
///
/// The task runs until the bus is dropped. Events missed while the consumer
/// lags are skipped with a warning; scoring resumes from the oldest
/// retained event.
pub fn spawn_scoring_consumer(
    bus: &BroadcastBus,
    analyzer: FraudAnalyzer,
    metrics: Arc<AntifraudMetrics>,
) -> JoinHandle<()> {
    let mut receiver = bus.subscribe();
    tokio::spawn(async move {
        info!("in-process scoring consumer started");
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let verdict = analyzer.analyze(&event).await;
                    metrics.record_event(verdict.fraud_detected);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "scoring consumer lagged, events skipped");
                }
                Err(RecvError::Closed) => {
                    info!("event bus closed, scoring consumer stopping");
                    break;
                }
            }
        }
    })
}
