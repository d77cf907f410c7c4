use std::sync::Arc;

use crate::config::TableConfig;
use crate::database::Gateway;
use crate::error::{ConfigError, FetchError};
use crate::models::VolumeFootprintRow;
use crate::repository::{fetch_serialized, into_entity, FetchParams, TableSpec};
use crate::serializer::decode_levels_column;

pub const DEFAULT_TABLE: &str = "tradingview_volume_footprint";

const PAYLOAD_COLUMNS: [&str; 9] = [
    "poc",
    "vah",
    "val",
    "volume_delta",
    "levels",
    "total_fp_volume",
    "volume_diff",
    "created_at",
    "updated_at",
];

/// Volume footprint bars: POC, value area and per-price `levels`.
pub struct VolumeFootprintRepository {
    gateway: Arc<dyn Gateway>,
    spec: TableSpec,
    columns: Vec<String>,
}

impl VolumeFootprintRepository {
    pub fn new(gateway: Arc<dyn Gateway>, config: &TableConfig) -> Result<Self, ConfigError> {
        let spec = TableSpec::new(config, DEFAULT_TABLE)?;

        let mut columns = vec![
            "fp_id".to_string(),
            spec.time_frame_select(),
            spec.symbol_select(),
            spec.timestamp_select(),
        ];
        columns.extend(spec.exchange_select());
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

    pub async fn fetch(&self, params: &FetchParams) -> Result<Vec<VolumeFootprintRow>, FetchError> {
        fetch_serialized(self.gateway.as_ref(), &self.spec, &self.columns, params)
            .await?
            .into_iter()
            .map(|row| into_entity(decode_levels_column(row, "levels")))
            .collect()
    }
}
