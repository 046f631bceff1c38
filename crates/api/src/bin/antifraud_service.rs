//! Antifraud service entry point

use std::sync::Arc;

use anyhow::Context;
use loadlab_core::FraudAnalyzer;
use loadlab_infra::{init_tracing, load_antifraud_config, AntifraudMetrics};
use loadlab_services::{antifraud_router, AntifraudState};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("antifraud-service");

    let config = load_antifraud_config();
    let state = Arc::new(AntifraudState {
        analyzer: FraudAnalyzer::new(),
        metrics: Arc::new(AntifraudMetrics::new()),
    });

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "antifraud service listening");

    axum::serve(listener, antifraud_router(state)).await.context("server error")?;
    Ok(())
}
