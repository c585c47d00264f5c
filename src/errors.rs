use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(sqlx::Error),
    #[error("Failed to write rebalance log: {0}")]
    Write(sqlx::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub detail: String,
}

impl AppError {
    /// Stable identifier callers can branch on.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Db(e) if is_connectivity_error(e) => "store_unavailable",
            AppError::Db(_) => "query_failed",
            AppError::Write(_) => "write_failed",
            AppError::Validation(_) => "validation",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Db(e) if is_connectivity_error(e) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Db(_) | AppError::Write(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }
}

fn is_connectivity_error(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_)
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = ErrorBody {
            kind: self.kind(),
            detail: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(value: sqlx::Error) -> Self {
        AppError::Db(value)
    }
}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        AppError::Validation(value)
    }
}
