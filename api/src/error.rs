use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use shared::FetchError;
use tracing::{error, warn};

/// Error returned from every HTTP handler.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Db(String),
    Internal(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(msg) => write!(f, "bad_request: {msg}"),
            Self::Db(msg) => write!(f, "db_error: {msg}"),
            Self::Internal(msg) => write!(f, "internal_error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_str) = match &self {
            Self::BadRequest(msg) => {
                warn!("Rejected request: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            Self::Db(msg) => {
                error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("db_error:{msg}"))
            }
            Self::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        let body = json!({ "error": error_str });
        (status, axum::Json(body)).into_response()
    }
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::InvalidFilter => Self::BadRequest(e.to_string()),
            FetchError::DataAccess(_) => Self::Db(e.to_string()),
            FetchError::RowShape(_) => Self::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_mapping() {
        let err = ApiError::from(FetchError::InvalidFilter);
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::BAD_REQUEST
        );

        let err = ApiError::from(FetchError::DataAccess(sqlx::Error::PoolTimedOut));
        assert!(matches!(err, ApiError::Db(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
