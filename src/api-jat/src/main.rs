use core_jat::{CorsConfig, get_api_base_url, get_db_pool, setup_logging};

use api_jat::routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if it exists
    dotenvy::dotenv().ok();

    setup_logging("api_jat=debug,data_model_jat=debug,tower_http=debug");

    let pool = get_db_pool().await?;
    let cors = CorsConfig::from_env()?;
    let app = routes::router(&cors).with_state(pool);

    let addr = get_api_base_url()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "job application tracker API listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    tracing::info!("shut down cleanly");
    Ok(())
}

/// Resolves on Ctrl+C, letting in-flight requests finish.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("received Ctrl+C, shutting down");
}
