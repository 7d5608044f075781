use anyhow::Context;
use campusdesk::campusdesk_config::ServerConfig;
use campusdesk::logging::{init_tracing, shutdown_tracer};
use campusdesk::metrics::{init_metrics, metrics_app};
use campusdesk::router::init_router;
use campusdesk::state::init_app_state;
use campusdesk::utils::expiry::spawn_purge_task;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing()?;

    let server_config = ServerConfig::from_env();

    match init_metrics() {
        Ok(Some(handle)) => {
            let addr = format!("0.0.0.0:{}", server_config.metrics_port);
            let listener = TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind metrics listener on {addr}"))?;
            info!(%addr, "Metrics available at /metrics");
            tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                    error!(error = %e, "metrics server stopped");
                }
            });
        }
        Ok(None) => info!("Metrics disabled"),
        Err(e) => error!(error = %e, "Failed to install metrics recorder"),
    }

    let state = init_app_state().await?;
    let purge_task = spawn_purge_task(
        state.db.clone(),
        server_config.purge_interval_secs,
        server_config.exam_retention_days,
    );
    let app = init_router(state);

    let addr = format!("0.0.0.0:{}", server_config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running on http://localhost:{}", server_config.port);
    info!("Swagger UI at http://localhost:{}/swagger-ui", server_config.port);
    info!("Scalar UI at http://localhost:{}/scalar", server_config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    purge_task.abort();
    shutdown_tracer().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("Shutting down");
}
