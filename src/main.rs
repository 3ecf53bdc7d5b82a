use std::net::SocketAddr;

use anyhow::Context;
use dotenvy::dotenv;
use learnhub::router::init_router;
use learnhub::state::init_app_state;
use learnhub_observability::{init_metrics, init_tracing, shutdown_tracer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    init_tracing();

    let state = init_app_state().await?;
    let bind_address = state.app_config.bind_address();

    let metrics_handle = init_metrics();
    #[cfg(feature = "observability")]
    {
        if let Some(handle) = metrics_handle {
            let metrics_port: u16 = std::env::var("METRICS_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(9090);
            let metrics_listener = tokio::net::TcpListener::bind(("0.0.0.0", metrics_port))
                .await
                .context("Failed to bind metrics listener")?;
            info!(port = metrics_port, "Prometheus metrics available at /metrics");
            tokio::spawn(async move {
                if let Err(e) =
                    axum::serve(metrics_listener, learnhub_observability::metrics_app(handle)).await
                {
                    tracing::error!(error = %e, "Metrics server stopped");
                }
            });
        }
    }
    #[cfg(not(feature = "observability"))]
    let _ = metrics_handle;

    let app = init_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!(address = %bind_address, "Server running");
    info!("Swagger UI available at /swagger-ui, Scalar UI at /scalar");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    shutdown_tracer().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
