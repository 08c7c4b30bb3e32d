use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt::Display;

use crate::services::balance_history::BalanceHistoryError;
use crate::services::resample::ResampleError;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

impl From<AppError> for (StatusCode, String) {
    fn from(err: AppError) -> Self {
        (err.status, err.message)
    }
}

pub type AppResult<T> = Result<T, AppError>;

pub fn internal_error(err: impl Display) -> (StatusCode, String) {
    tracing::error!(error = %err, "internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

pub fn map_db_error(err: sqlx::Error) -> (StatusCode, String) {
    let status = match &err {
        sqlx::Error::PoolTimedOut => StatusCode::SERVICE_UNAVAILABLE,
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some("22P02") => StatusCode::BAD_REQUEST, // invalid_text_representation
            Some("22003") => StatusCode::BAD_REQUEST, // numeric_value_out_of_range
            Some("57014") => StatusCode::SERVICE_UNAVAILABLE, // query_canceled
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    tracing::error!(error = %err, status = %status, "database error");

    let message = match status {
        StatusCode::BAD_REQUEST => "Invalid request",
        StatusCode::SERVICE_UNAVAILABLE => "Database unavailable",
        _ => "Database error",
    };

    (status, message.to_string())
}

pub fn map_resample_error(err: ResampleError) -> (StatusCode, String) {
    match err {
        ResampleError::InvalidRange { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        ResampleError::MissingTimeMapping { block } => {
            tracing::error!(block, "block has no timestamp in the time index");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("No timestamp recorded for block {block}"),
            )
        }
        ResampleError::Cancelled => {
            tracing::warn!("resample cancelled");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Query cancelled".to_string(),
            )
        }
    }
}

pub fn map_history_error(err: BalanceHistoryError) -> (StatusCode, String) {
    match err {
        BalanceHistoryError::Database(err) => map_db_error(err),
        BalanceHistoryError::Resample(err) => map_resample_error(err),
        BalanceHistoryError::Worker(message) => internal_error(message),
    }
}
