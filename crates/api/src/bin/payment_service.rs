//! Payment service entry point

use std::sync::Arc;

use anyhow::Context;
use loadlab_common::chaos::{LagController, LagControllerConfig};
use loadlab_core::{EventPublisher, FraudAnalyzer, PaymentPipeline};
use loadlab_infra::{
    init_tracing, load_payment_config, spawn_scoring_consumer, AntifraudMetrics, BroadcastBus,
    HttpEventPublisher, PaymentMetrics,
};
use loadlab_services::{payment_router, PaymentState};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("payment-service");

    let config = load_payment_config();

    let lag = Arc::new(LagController::new(LagControllerConfig {
        enabled: config.lag.enabled,
        injection_probability: config.lag.injection_probability,
        database_delay: config.lag.database_delay,
        cache_delay: config.lag.cache_delay,
        external_delay: config.lag.external_delay,
    }));

    let publisher: Arc<dyn EventPublisher> = match &config.antifraud_url {
        Some(url) => {
            info!(url, "delivering events to remote antifraud service");
            Arc::new(HttpEventPublisher::new(url)?)
        }
        None => {
            info!("no antifraud peer configured, scoring events in-process");
            let bus = BroadcastBus::default();
            spawn_scoring_consumer(&bus, FraudAnalyzer::new(), Arc::new(AntifraudMetrics::new()));
            Arc::new(bus)
        }
    };

    let pipeline =
        PaymentPipeline::new(&config.rate_limit, &config.breaker, Arc::clone(&lag), publisher)
            .context("invalid resilience configuration")?;

    let state = Arc::new(PaymentState {
        pipeline,
        lag,
        metrics: Arc::new(PaymentMetrics::new()),
    });

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "payment service listening");

    axum::serve(listener, payment_router(state)).await.context("server error")?;
    Ok(())
}
