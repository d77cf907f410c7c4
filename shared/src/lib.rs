pub mod config;
pub mod database;
pub mod envelope;
pub mod error;
pub mod identifier;
pub mod models;
pub mod repository;
pub mod serializer;
pub mod timeframe;

pub use config::{Config, DatabaseConfig, TableConfig};
pub use database::{get_pool, DbPool, Gateway, MySqlGateway, SqlParam, SqlRow, SqlValue};
pub use envelope::{Envelope, EnvelopeRow};
pub use error::{ConfigError, FetchError};
pub use models::*;
pub use repository::{
    CandleRepository, CvdRepository, EmaRepository, FetchParams, Repositories,
    VolumeFootprintRepository,
};
