//! HTTP event delivery to a remote antifraud service

use std::time::Duration;

use async_trait::async_trait;
use loadlab_core::EventPublisher;
use loadlab_domain::{constants, LoadLabError, PaymentEvent, Result};
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Publishes events with `POST {base_url}/events`, propagating the event's
/// correlation ID in the `X-Correlation-ID` header.
#[derive(Debug, Clone)]
pub struct HttpEventPublisher {
    client: reqwest::Client,
    events_url: String,
}

impl HttpEventPublisher {
    /// Build a publisher for the given antifraud base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LoadLabError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, events_url: format!("{}/events", base_url.trim_end_matches('/')) })
    }

    /// Destination URL events are posted to.
    pub fn events_url(&self) -> &str {
        &self.events_url
    }
}

#[async_trait]
impl EventPublisher for HttpEventPublisher {
    async fn publish(&self, event: &PaymentEvent) -> Result<()> {
        let response = self
            .client
            .post(&self.events_url)
            .header(constants::CORRELATION_HEADER, &event.correlation_id)
            .json(event)
            .send()
            .await
            .map_err(|e| LoadLabError::Transport(format!("event delivery failed: {e}")))?;

        if !response.status().is_success() {
            return Err(LoadLabError::Transport(format!(
                "event delivery rejected with status {}",
                response.status()
            )));
        }

        debug!(payment_id = %event.payment_id, url = %self.events_url, "event delivered");
        Ok(())
    }
}
