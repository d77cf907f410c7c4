use std::sync::Arc;

use crate::config::TableConfig;
use crate::database::Gateway;
use crate::error::{ConfigError, FetchError};
use crate::models::EmaRow;
use crate::repository::{fetch_serialized, into_entity, FetchParams, TableSpec};

pub const DEFAULT_TABLE: &str = "tradingview_ema";

// Digit-leading names are legal in MySQL but read better quoted.
const PAYLOAD_COLUMNS: [&str; 5] = ["`20_ema`", "`50_ema`", "`100_ema`", "`200_ema`", "date_time"];

/// Precomputed 20/50/100/200 period EMAs.
pub struct EmaRepository {
    gateway: Arc<dyn Gateway>,
    spec: TableSpec,
    columns: Vec<String>,
}

impl EmaRepository {
    pub fn new(gateway: Arc<dyn Gateway>, config: &TableConfig) -> Result<Self, ConfigError> {
        let spec = TableSpec::new(config, DEFAULT_TABLE)?;

        let mut columns = vec!["e_id".to_string()];
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

    pub async fn fetch(&self, params: &FetchParams) -> Result<Vec<EmaRow>, FetchError> {
        fetch_serialized(self.gateway.as_ref(), &self.spec, &self.columns, params)
            .await?
            .into_iter()
            .map(|row| into_entity::<EmaRow>(row).map(EmaRow::with_underscore_aliases))
            .collect()
    }
}
