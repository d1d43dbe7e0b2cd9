use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use readings_service::{
    config::AppConfig,
    gateway::{self, GatewayState},
    metrics_server, observability,
    observability::PrometheusSink,
    rpc::client::HttpRpcClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr);
    }

    let upstream_timeout = Duration::from_millis(cfg.gateway.upstream_timeout_ms);
    let client = HttpRpcClient::new(cfg.gateway.rpc_target.clone(), upstream_timeout);

    // Reduce startup races when both processes come up together.
    client
        .wait_ready(Duration::from_millis(cfg.gateway.rpc_wait_timeout_ms))
        .await;

    let state = GatewayState {
        rpc: Arc::new(client),
        telemetry: Arc::new(PrometheusSink),
        upstream_timeout,
    };
    let app = gateway::router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.gateway.bind_addr).await?;
    tracing::info!(
        addr = %cfg.gateway.bind_addr,
        rpc_target = %cfg.gateway.rpc_target,
        "gateway listening",
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install ctrl-c handler");
        return;
    }
    tracing::info!("shutting down gateway");
}
