use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::{BookingConflict, ScheduleError};

/// Failures reported by a [`crate::services::booking::BookingStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("an active booking already exists for this slot")]
    Duplicate,

    #[error("stored schedule is invalid: {0}")]
    InvalidSchedule(#[from] ScheduleError),

    #[error("{0}")]
    Unavailable(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Unavailable(e.into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("you already have this session booked")]
    DuplicateBooking(Box<BookingConflict>),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            // Callers that can name the existing booking translate this
            // themselves; anything reaching here has no details to show.
            StoreError::Duplicate => {
                AppError::Conflict("an active booking already exists for this slot".to_string())
            }
            StoreError::InvalidSchedule(e) => AppError::Config(e.to_string()),
            StoreError::Unavailable(e) => AppError::StorageUnavailable(format!("{e:#}")),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::StorageUnavailable(format!("{e:#}"))
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::StorageUnavailable(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateBooking(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::StorageUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = match &self {
            AppError::DuplicateBooking(existing) => serde_json::json!({
                "error": self.to_string(),
                "existing": existing,
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (status, axum::Json(body)).into_response()
    }
}
