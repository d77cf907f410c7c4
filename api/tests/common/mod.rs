#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::sync::{Arc, Mutex};

use market_api::AppState;
use shared::{
    Config, DatabaseConfig, Gateway, Repositories, SqlParam, SqlRow, SqlValue, TableConfig,
};

/// Returns its rows newest first, cut to the bound LIMIT. Filters are not
/// applied; tests only look at what was bound.
#[derive(Default)]
pub struct FakeGateway {
    rows: Vec<SqlRow>,
    fail: bool,
    calls: Mutex<Vec<(String, Vec<SqlParam>)>>,
}

impl FakeGateway {
    pub fn with_rows(rows: Vec<SqlRow>) -> Arc<Self> {
        Arc::new(Self {
            rows,
            ..Default::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }

    pub fn calls(&self) -> Vec<(String, Vec<SqlParam>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn fetch_all(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<SqlRow>, sqlx::Error> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        if self.fail {
            return Err(sqlx::Error::PoolTimedOut);
        }

        let limit = match params.last() {
            Some(SqlParam::Int(limit)) => *limit as usize,
            other => panic!("last parameter must be the limit, got {other:?}"),
        };
        let mut rows: Vec<SqlRow> = self.rows.iter().rev().cloned().collect();
        rows.truncate(limit);
        Ok(rows)
    }
}

pub fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 2)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap()
}

/// `count` five-minute bars starting at 09:15, oldest first. Carries the
/// payload columns of every table so one fixture serves all four routes.
pub fn market_rows(count: i64) -> Vec<SqlRow> {
    (0..count)
        .map(|i| {
            SqlRow::new()
                .with("symbol", SqlValue::Text("NIFTY".into()))
                .with("time_frame", SqlValue::Text("5m".into()))
                .with(
                    "timestamp",
                    SqlValue::DateTime(base_time() + Duration::minutes(5 * i)),
                )
                .with("open", SqlValue::Float(22000.0 + i as f64))
                .with("close", SqlValue::Float(22010.0 + i as f64))
                .with("fp_id", SqlValue::Int(i + 1))
                .with("levels", SqlValue::Text("{\"22000\": 15}".into()))
                .with("20_ema", SqlValue::Float(21990.5))
        })
        .collect()
}

pub fn test_config() -> Config {
    Config {
        database: DatabaseConfig {
            host: "localhost".into(),
            port: 3306,
            user: "reader".into(),
            password: String::new(),
            database: "market".into(),
            max_connections: 1,
        },
        api_host: "127.0.0.1".into(),
        api_port: 9000,
        candles: TableConfig::with_defaults("tradingview_candle_data", Some("exchange")),
        footprints: TableConfig::with_defaults("tradingview_volume_footprint", None),
        cvd: TableConfig::with_defaults("tradingview_candle_cvd", Some("exchange")),
        ema: TableConfig::with_defaults("tradingview_ema", Some("exchange")),
    }
}

pub fn test_state(gateway: Arc<FakeGateway>) -> Arc<AppState> {
    let repos = Repositories::new(gateway, &test_config()).unwrap();
    AppState::new(repos)
}
