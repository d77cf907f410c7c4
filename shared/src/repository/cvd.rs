use std::sync::Arc;

use crate::config::TableConfig;
use crate::database::Gateway;
use crate::error::{ConfigError, FetchError};
use crate::models::CvdRow;
use crate::repository::{fetch_serialized, into_entity, FetchParams, TableSpec};

pub const DEFAULT_TABLE: &str = "tradingview_candle_cvd";

const PAYLOAD_COLUMNS: [&str; 7] = [
    "open",
    "high",
    "low",
    "close",
    "ohlc_color",
    "wick_color",
    "border_color",
];

/// Cumulative volume delta candles with their display colours.
pub struct CvdRepository {
    gateway: Arc<dyn Gateway>,
    spec: TableSpec,
    columns: Vec<String>,
}

impl CvdRepository {
    pub fn new(gateway: Arc<dyn Gateway>, config: &TableConfig) -> Result<Self, ConfigError> {
        let spec = TableSpec::new(config, DEFAULT_TABLE)?;

        let mut columns = vec!["cvd_id".to_string()];
        columns.extend(spec.exchange_select());
        columns.extend([spec.symbol_select(), spec.time_frame_select(), spec.timestamp_select()]);
        columns.extend(PAYLOAD_COLUMNS.iter().map(|c| c.to_string()));

        Ok(Self {
            gateway,
            spec,
            columns,
        })
    }

    pub fn spec(&self) -> &TableSpec {
        &self.spec
    }

    pub async fn fetch(&self, params: &FetchParams) -> Result<Vec<CvdRow>, FetchError> {
        fetch_serialized(self.gateway.as_ref(), &self.spec, &self.columns, params)
            .await?
            .into_iter()
            .map(into_entity)
            .collect()
    }
}
