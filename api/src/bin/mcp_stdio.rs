//! Tool server over stdin/stdout, one JSON-RPC message per line.

use anyhow::Result;
use dotenv::dotenv;
use market_api::mcp::serve_lines;
use market_api::telemetry::init_tracing;
use market_api::AppState;
use shared::Config;
use tokio::io::BufReader;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    // stdout belongs to the protocol.
    init_tracing(true);

    let config = Config::from_env()?;
    let state = AppState::connect(&config).await?;
    info!("Tool server ready on stdio");

    serve_lines(&state, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}
