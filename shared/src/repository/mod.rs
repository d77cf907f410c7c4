//! Read repositories, one per table.
//!
//! All four share the same filter grammar and statement shape; they differ
//! only in the payload columns they select and in a post-processing step.

pub mod candle;
pub mod cvd;
pub mod ema;
pub mod footprint;

pub use candle::CandleRepository;
pub use cvd::CvdRepository;
pub use ema::EmaRepository;
pub use footprint::VolumeFootprintRepository;

use serde::de::{self, DeserializeOwned, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use std::fmt;
use std::sync::Arc;

use crate::config::{Config, TableConfig};
use crate::database::{Gateway, SqlParam, SqlRow};
use crate::error::{ConfigError, FetchError};
use crate::identifier::{sanitize_identifier, sanitize_optional_identifier};
use crate::serializer::{serialize_row, to_json_object};
use crate::timeframe::normalize_time_frame;

pub const DEFAULT_LIMIT: i64 = 200;
pub const MAX_LIMIT: i64 = 1000;

pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_LIMIT)
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Any number (or numeric string from a query string) is accepted and
/// saturated into `i64`; `clamp_limit` does the rest. Null means default.
fn saturating_limit<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct LimitVisitor;

    impl<'de> Visitor<'de> for LimitVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            Ok(i64::try_from(v).unwrap_or(i64::MAX))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            // `as` saturates and maps NaN to 0.
            Ok(v.trunc() as i64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
            let v = v.trim();
            if let Ok(n) = v.parse::<i64>() {
                return Ok(n);
            }
            match v.parse::<f64>() {
                Ok(f) => self.visit_f64(f),
                Err(_) => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
            }
        }

        fn visit_unit<E: de::Error>(self) -> Result<i64, E> {
            Ok(DEFAULT_LIMIT)
        }

        fn visit_none<E: de::Error>(self) -> Result<i64, E> {
            Ok(DEFAULT_LIMIT)
        }
    }

    deserializer.deserialize_any(LimitVisitor)
}

/// Filter parameters shared by every fetch, on every transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchParams {
    pub symbol: String,
    pub time_frame: String,
    #[serde(default = "default_limit", deserialize_with = "saturating_limit")]
    pub limit: i64,
    #[serde(default)]
    pub exchange: Option<String>,
    /// Inclusive, `YYYY-MM-DD HH:MM:SS`.
    #[serde(default)]
    pub start_timestamp: Option<String>,
    /// Inclusive, `YYYY-MM-DD HH:MM:SS`.
    #[serde(default)]
    pub end_timestamp: Option<String>,
}

impl FetchParams {
    pub fn new(symbol: impl Into<String>, time_frame: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            time_frame: time_frame.into(),
            limit: DEFAULT_LIMIT,
            exchange: None,
            start_timestamp: None,
            end_timestamp: None,
        }
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    pub fn between(mut self, start: Option<&str>, end: Option<&str>) -> Self {
        self.start_timestamp = start.map(str::to_string);
        self.end_timestamp = end.map(str::to_string);
        self
    }
}

/// Sanitized table and identity column names. Built once, never changed.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSpec {
    pub table: String,
    pub symbol_column: String,
    pub time_frame_column: String,
    pub timestamp_column: String,
    pub exchange_column: Option<String>,
}

impl TableSpec {
    pub fn new(config: &TableConfig, default_table: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            table: sanitize_identifier(&config.table, default_table)?,
            symbol_column: sanitize_identifier(&config.symbol_column, "symbol")?,
            time_frame_column: sanitize_identifier(&config.time_frame_column, "time_frame")?,
            timestamp_column: sanitize_identifier(&config.timestamp_column, "timestamp")?,
            exchange_column: sanitize_optional_identifier(
                config.exchange_column.as_deref(),
                "exchange",
            )?,
        })
    }

    pub fn symbol_select(&self) -> String {
        format!("{} AS symbol", self.symbol_column)
    }

    pub fn time_frame_select(&self) -> String {
        format!("{} AS time_frame", self.time_frame_column)
    }

    pub fn timestamp_select(&self) -> String {
        format!("{} AS timestamp", self.timestamp_column)
    }

    pub fn exchange_select(&self) -> Option<String> {
        self.exchange_column
            .as_ref()
            .map(|column| format!("{column} AS exchange"))
    }
}

/// A statement ready for the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

/// Build the filtered, newest-first, limited select. Rejects an exchange
/// filter on a table without an exchange column before anything runs.
pub fn build_query(
    spec: &TableSpec,
    select_columns: &[String],
    params: &FetchParams,
) -> Result<QueryPlan, FetchError> {
    let limit = clamp_limit(params.limit);
    let time_frame = normalize_time_frame(&params.time_frame);

    let mut sql_parts = vec![
        format!("SELECT {} FROM {}", select_columns.join(", "), spec.table),
        format!(
            "WHERE {} = ? AND {} = ?",
            spec.symbol_column, spec.time_frame_column
        ),
    ];
    let mut bound = vec![
        SqlParam::Text(params.symbol.clone()),
        SqlParam::Text(time_frame.to_string()),
    ];

    if let Some(exchange) = &params.exchange {
        let column = spec.exchange_column.as_ref().ok_or(FetchError::InvalidFilter)?;
        sql_parts.push(format!("AND {column} = ?"));
        bound.push(SqlParam::Text(exchange.clone()));
    }

    if let Some(start) = &params.start_timestamp {
        sql_parts.push(format!("AND {} >= ?", spec.timestamp_column));
        bound.push(SqlParam::Text(start.clone()));
    }
    if let Some(end) = &params.end_timestamp {
        sql_parts.push(format!("AND {} <= ?", spec.timestamp_column));
        bound.push(SqlParam::Text(end.clone()));
    }

    sql_parts.push(format!("ORDER BY {} DESC", spec.timestamp_column));
    sql_parts.push("LIMIT ?".to_string());
    bound.push(SqlParam::Int(limit));

    Ok(QueryPlan {
        sql: sql_parts.join(" "),
        params: bound,
    })
}

/// Run the plan and return serialized rows, oldest first.
pub(crate) async fn fetch_serialized(
    gateway: &dyn Gateway,
    spec: &TableSpec,
    select_columns: &[String],
    params: &FetchParams,
) -> Result<Vec<SqlRow>, FetchError> {
    let plan = build_query(spec, select_columns, params)?;
    debug!(table = %spec.table, sql = %plan.sql, params = plan.params.len(), "executing fetch");

    let mut rows = gateway.fetch_all(&plan.sql, &plan.params).await?;
    // Newest-first from the database so LIMIT keeps the most recent rows.
    rows.reverse();
    debug!(table = %spec.table, rows = rows.len(), "fetch complete");

    Ok(rows.into_iter().map(serialize_row).collect())
}

/// Every repository, built from one validated configuration at startup.
pub struct Repositories {
    pub candles: CandleRepository,
    pub footprints: VolumeFootprintRepository,
    pub cvd: CvdRepository,
    pub ema: EmaRepository,
}

impl Repositories {
    pub fn new(gateway: Arc<dyn Gateway>, config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            candles: CandleRepository::new(Arc::clone(&gateway), &config.candles)?,
            footprints: VolumeFootprintRepository::new(Arc::clone(&gateway), &config.footprints)?,
            cvd: CvdRepository::new(Arc::clone(&gateway), &config.cvd)?,
            ema: EmaRepository::new(gateway, &config.ema)?,
        })
    }
}

/// Map a serialized row onto its entity struct.
pub(crate) fn into_entity<T: DeserializeOwned>(row: SqlRow) -> Result<T, FetchError> {
    Ok(serde_json::from_value(Value::Object(to_json_object(row)))?)
}
