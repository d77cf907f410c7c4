use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use shared::FetchParams;
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::state::{AppState, Dataset};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/candles", get(get_candles))
        .route("/volume-footprint", get(get_volume_footprint))
        .route("/cvd", get(get_cvd))
        .route("/ema", get(get_ema))
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn get_candles(
    State(state): State<Arc<AppState>>,
    params: Result<Query<FetchParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    fetch(&state, Dataset::Candles, params).await
}

async fn get_volume_footprint(
    State(state): State<Arc<AppState>>,
    params: Result<Query<FetchParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    fetch(&state, Dataset::VolumeFootprint, params).await
}

async fn get_cvd(
    State(state): State<Arc<AppState>>,
    params: Result<Query<FetchParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    fetch(&state, Dataset::Cvd, params).await
}

async fn get_ema(
    State(state): State<Arc<AppState>>,
    params: Result<Query<FetchParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    fetch(&state, Dataset::Ema, params).await
}

async fn fetch(
    state: &AppState,
    dataset: Dataset,
    params: Result<Query<FetchParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    info!(
        "{} symbol={} time_frame={} limit={}",
        dataset.tool_name(),
        params.symbol,
        params.time_frame,
        params.limit
    );

    let envelope = state.fetch_envelope(dataset, &params).await?;
    Ok(Json(envelope))
}
