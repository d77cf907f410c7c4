use dotenv::dotenv;
use std::env;

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
}

/// Raw, not yet sanitized, table/column names for one entity.
///
/// `exchange_column: None` (or an empty string) disables exchange filtering
/// for that entity.
#[derive(Debug, Clone, PartialEq)]
pub struct TableConfig {
    pub table: String,
    pub symbol_column: String,
    pub time_frame_column: String,
    pub timestamp_column: String,
    pub exchange_column: Option<String>,
}

impl TableConfig {
    pub fn with_defaults(table: &str, exchange_column: Option<&str>) -> Self {
        Self {
            table: table.to_string(),
            symbol_column: "symbol".to_string(),
            time_frame_column: "time_frame".to_string(),
            timestamp_column: "timestamp".to_string(),
            exchange_column: exchange_column.map(str::to_string),
        }
    }

    /// Read `<prefix>TABLE`, `<prefix>SYMBOL_COLUMN`, ... falling back to `defaults`.
    pub fn from_env(prefix: &str, defaults: TableConfig) -> Self {
        let var = |suffix: &str| env::var(format!("{prefix}{suffix}")).ok();
        Self {
            table: var("TABLE").unwrap_or(defaults.table),
            symbol_column: var("SYMBOL_COLUMN").unwrap_or(defaults.symbol_column),
            time_frame_column: var("TIME_FRAME_COLUMN").unwrap_or(defaults.time_frame_column),
            timestamp_column: var("TIMESTAMP_COLUMN").unwrap_or(defaults.timestamp_column),
            exchange_column: var("EXCHANGE_COLUMN").or(defaults.exchange_column),
        }
    }
}

pub struct Config {
    pub database: DatabaseConfig,
    pub api_host: String,
    pub api_port: u16,
    pub candles: TableConfig,
    pub footprints: TableConfig,
    pub cvd: TableConfig,
    pub ema: TableConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        Ok(Config {
            database: DatabaseConfig::from_env()?,
            api_host: env_str("API_HOST", "0.0.0.0"),
            api_port: env_parse("API_PORT", 9000)?,
            candles: TableConfig::from_env(
                "CANDLE_",
                TableConfig::with_defaults("tradingview_candle_data", Some("exchange")),
            ),
            footprints: TableConfig::from_env(
                "FOOTPRINT_",
                TableConfig::with_defaults("tradingview_volume_footprint", None),
            ),
            cvd: TableConfig::from_env(
                "CVD_",
                TableConfig::with_defaults("tradingview_candle_cvd", Some("exchange")),
            ),
            ema: TableConfig::from_env(
                "EMA_",
                TableConfig::with_defaults("tradingview_ema", Some("exchange")),
            ),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        const REQUIRED: [&str; 5] = ["DB_HOST", "DB_PORT", "DB_USER", "DB_PASSWORD", "DB_NAME"];

        let missing: Vec<&str> = REQUIRED
            .iter()
            .copied()
            .filter(|name| env::var(name).map(|v| v.is_empty()).unwrap_or(true))
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingEnv(missing.join(", ")));
        }

        Ok(DatabaseConfig {
            host: env_str("DB_HOST", ""),
            port: env_parse("DB_PORT", 3306)?,
            user: env_str("DB_USER", ""),
            password: env::var("DB_PASSWORD").unwrap_or_default(),
            database: env_str("DB_NAME", ""),
            max_connections: env_parse("DB_MAX_CONNECTIONS", 5)?,
        })
    }
}

fn env_str(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: name.to_string(),
                value: raw,
            })
        }
        _ => Ok(default),
    }
}
