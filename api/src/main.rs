use anyhow::Result;
use dotenv::dotenv;
use market_api::telemetry::init_tracing;
use market_api::AppState;
use shared::Config;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing(false);

    info!("Starting market data API server...");

    let config = Config::from_env()?;
    let state = AppState::connect(&config).await?;

    let app = market_api::app(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on http://{}", addr);
    info!("Tool endpoint available at: http://{}/mcp", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, gracefully stopping");
}
