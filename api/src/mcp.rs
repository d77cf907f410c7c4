//! JSON-RPC 2.0 tool endpoint, served over `POST /mcp` and over stdio.
//!
//! Every request is answered independently, so the same dispatcher backs
//! both transports. Notifications (requests without an `id`) are accepted
//! and never answered.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use shared::FetchParams;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::state::{AppState, Dataset};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "tradingview-candle-server";

const INSTRUCTIONS: &str = "Retrieve historical market data from the trading database. \
Use get_candles to pull OHLCV rows for a given symbol/time frame. \
Use get_volume_footprint to retrieve POC/VAH/VAL/volume delta, levels, totals, and diffs. \
Use get_cvd to retrieve cumulative volume delta candles. \
Use get_ema to retrieve 20/50/100/200 period EMA values. \
Timestamps are returned as ISO-8601 strings and the data is sorted chronologically.";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
struct RpcRequest {
    /// `None` only when the field is absent; `"id": null` is still a request.
    #[serde(default, deserialize_with = "present_id")]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

fn present_id<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
pub struct RpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

impl RpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RpcError {
    code: i64,
    message: String,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/mcp", post(mcp_http))
}

async fn mcp_http(State(state): State<Arc<AppState>>, body: String) -> Response {
    match handle_text(&state, &body).await {
        Some(text) => ([(header::CONTENT_TYPE, "application/json")], text).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Answer newline-delimited requests from `reader` until it closes.
pub async fn serve_lines<R, W>(state: &AppState, reader: R, mut writer: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(response) = handle_text(state, line).await {
            writer.write_all(response.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }
    info!("Input closed, stopping tool server");
    Ok(())
}

/// Handle one raw message. `None` means nothing should be sent back.
pub async fn handle_text(state: &AppState, text: &str) -> Option<String> {
    let response = match serde_json::from_str::<Value>(text) {
        Ok(value) => handle_value(state, value).await?,
        Err(e) => RpcResponse::failure(
            Value::Null,
            RpcError::new(PARSE_ERROR, format!("Parse error: {e}")),
        ),
    };

    match serde_json::to_string(&response) {
        Ok(text) => Some(text),
        Err(e) => {
            error!("Failed to encode response: {}", e);
            None
        }
    }
}

pub async fn handle_value(state: &AppState, value: Value) -> Option<RpcResponse> {
    let request: RpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            return Some(RpcResponse::failure(
                Value::Null,
                RpcError::new(INVALID_REQUEST, format!("Invalid request: {e}")),
            ))
        }
    };

    let Some(id) = request.id else {
        debug!("Notification {}", request.method);
        return None;
    };

    Some(match dispatch(state, &request.method, request.params).await {
        Ok(result) => RpcResponse::success(id, result),
        Err(err) => RpcResponse::failure(id, err),
    })
}

async fn dispatch(state: &AppState, method: &str, params: Value) -> Result<Value, RpcError> {
    match method {
        "initialize" => Ok(initialize_result(&params)),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": tool_definitions() })),
        "tools/call" => call_tool(state, params).await,
        other => Err(RpcError::new(
            METHOD_NOT_FOUND,
            format!("Method not found: {other}"),
        )),
    }
}

fn initialize_result(params: &Value) -> Value {
    let version = params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .unwrap_or(PROTOCOL_VERSION);

    json!({
        "protocolVersion": version,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
        "instructions": INSTRUCTIONS,
    })
}

pub fn tool_definitions() -> Vec<Value> {
    Dataset::ALL
        .into_iter()
        .map(|dataset| {
            json!({
                "name": dataset.tool_name(),
                "description": dataset.description(),
                "inputSchema": input_schema(),
            })
        })
        .collect()
}

fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "symbol": {
                "type": "string",
                "description": "Ticker or instrument identifier exactly as stored in the DB."
            },
            "time_frame": {
                "type": "string",
                "description": "Time frame value stored in the time_frame column (e.g. 1, 5, 60, 1D). '30' is normalized to '30m'."
            },
            "limit": {
                "type": "integer",
                "default": 200,
                "description": "Maximum number of rows to return, clamped to 1-1000."
            },
            "exchange": {
                "type": "string",
                "description": "Optional exchange to filter if multiple venues store the same symbol."
            },
            "start_timestamp": {
                "type": "string",
                "description": "Inclusive timestamp filter in 'YYYY-MM-DD HH:MM:SS' format."
            },
            "end_timestamp": {
                "type": "string",
                "description": "Inclusive timestamp upper bound in 'YYYY-MM-DD HH:MM:SS' format."
            }
        },
        "required": ["symbol", "time_frame"]
    })
}

async fn call_tool(state: &AppState, params: Value) -> Result<Value, RpcError> {
    let call: ToolCall = serde_json::from_value(params)
        .map_err(|e| RpcError::new(INVALID_PARAMS, format!("Invalid tool call: {e}")))?;

    let dataset = Dataset::from_tool_name(&call.name)
        .ok_or_else(|| RpcError::new(INVALID_PARAMS, format!("Unknown tool: {}", call.name)))?;

    let arguments = call.arguments.unwrap_or_else(|| json!({}));
    let params: FetchParams = serde_json::from_value(arguments).map_err(|e| {
        RpcError::new(
            INVALID_PARAMS,
            format!("Invalid arguments for {}: {e}", call.name),
        )
    })?;

    info!(
        "Tool {} symbol={} time_frame={} limit={}",
        call.name, params.symbol, params.time_frame, params.limit
    );

    match state.fetch_envelope(dataset, &params).await {
        Ok(envelope) => Ok(json!({
            "content": [{ "type": "text", "text": envelope.to_string() }],
            "structuredContent": envelope,
            "isError": false,
        })),
        Err(e) => {
            if e.is_client_error() {
                warn!("Tool {} rejected: {}", call.name, e);
            } else {
                error!("Tool {} failed: {}", call.name, e);
            }
            Ok(json!({
                "content": [{ "type": "text", "text": e.to_string() }],
                "isError": true,
            }))
        }
    }
}
