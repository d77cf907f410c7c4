use anyhow::Result;
use serde_json::Value;
use shared::{
    get_pool, Config, Envelope, FetchError, FetchParams, Gateway, MySqlGateway, Repositories,
};
use std::sync::Arc;
use tracing::info;

/// The four read operations, named the way tool clients see them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Candles,
    VolumeFootprint,
    Cvd,
    Ema,
}

impl Dataset {
    pub const ALL: [Dataset; 4] = [
        Dataset::Candles,
        Dataset::VolumeFootprint,
        Dataset::Cvd,
        Dataset::Ema,
    ];

    pub fn tool_name(self) -> &'static str {
        match self {
            Dataset::Candles => "get_candles",
            Dataset::VolumeFootprint => "get_volume_footprint",
            Dataset::Cvd => "get_cvd",
            Dataset::Ema => "get_ema",
        }
    }

    pub fn from_tool_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.tool_name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Dataset::Candles => "Fetch OHLCV candles for the given symbol/resolution.",
            Dataset::VolumeFootprint => {
                "Fetch volume footprint data (POC/VAH/VAL, volume delta, levels, totals) for the given symbol/resolution."
            }
            Dataset::Cvd => "Fetch cumulative volume delta (CVD) candles for the given symbol/resolution.",
            Dataset::Ema => "Fetch 20/50/100/200 period EMA values for the given symbol/resolution.",
        }
    }
}

/// Shared by every handler. Holds only immutable repositories.
pub struct AppState {
    pub repos: Repositories,
}

impl AppState {
    pub fn new(repos: Repositories) -> Arc<Self> {
        Arc::new(Self { repos })
    }

    /// Connect the pool and build every repository from `config`.
    pub async fn connect(config: &Config) -> Result<Arc<Self>> {
        let pool = get_pool(&config.database).await?;
        info!("Connected to database");

        let gateway: Arc<dyn Gateway> = Arc::new(MySqlGateway::new(pool));
        let repos = Repositories::new(gateway, config)?;
        Ok(Self::new(repos))
    }

    /// Run one dataset fetch and wrap it in its response envelope.
    pub async fn fetch_envelope(
        &self,
        dataset: Dataset,
        params: &FetchParams,
    ) -> Result<Value, FetchError> {
        let value = match dataset {
            Dataset::Candles => {
                serde_json::to_value(Envelope::new(self.repos.candles.fetch(params).await?))?
            }
            Dataset::VolumeFootprint => {
                serde_json::to_value(Envelope::new(self.repos.footprints.fetch(params).await?))?
            }
            Dataset::Cvd => serde_json::to_value(Envelope::new(self.repos.cvd.fetch(params).await?))?,
            Dataset::Ema => serde_json::to_value(Envelope::new(self.repos.ema.fetch(params).await?))?,
        };
        Ok(value)
    }
}
