use thiserror::Error;

/// Startup failures. Nothing here is recoverable at request time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required database environment variables: {0}")]
    MissingEnv(String),

    #[error("Invalid identifier provided: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

/// Failures of a single fetch call.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Exchange filtering requested but no exchange column configured.")]
    InvalidFilter,

    #[error("database query failed: {0}")]
    DataAccess(#[from] sqlx::Error),

    #[error("row does not match the expected shape: {0}")]
    RowShape(#[from] serde_json::Error),
}

impl FetchError {
    /// True when the caller sent something we refuse to run.
    pub fn is_client_error(&self) -> bool {
        matches!(self, FetchError::InvalidFilter)
    }
}
