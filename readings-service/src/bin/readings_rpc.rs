use std::sync::Arc;

use anyhow::Result;
use readings_service::{
    config::AppConfig, metrics_server, observability, rpc, service::ReadingQueryService,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr);
    }

    // A few bad rows are tolerable; we keep going as long as the file
    // yielded usable readings.
    let (store, skipped) = meter_store::csvfile::load_from_file(&cfg.store.csv_path)?;
    for row in &skipped {
        tracing::warn!(row = row.row, reason = %row.reason, "skipped csv row");
    }
    tracing::info!(
        readings = store.len(),
        skipped = skipped.len(),
        path = %cfg.store.csv_path,
        "loaded reading store",
    );

    let svc = Arc::new(ReadingQueryService::new(Arc::new(store)));
    let app = rpc::server::router(svc);

    let listener = tokio::net::TcpListener::bind(&cfg.rpc.bind_addr).await?;
    tracing::info!(addr = %cfg.rpc.bind_addr, "rpc server listening");

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
    tracing::info!("shutting down rpc server");
}
