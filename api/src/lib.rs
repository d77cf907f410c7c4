pub mod error;
pub mod mcp;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use state::{AppState, Dataset};

/// Data routes plus the `/mcp` tool endpoint.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::routes())
        .merge(mcp::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
