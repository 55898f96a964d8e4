use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Session expired")]
    SessionExpired,

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Prefixes persistence failures with the operation that hit them.
    /// Other variants pass through untouched.
    pub fn context(self, context: &str) -> Self {
        match self {
            AppError::PersistenceFailure(msg) => {
                AppError::PersistenceFailure(format!("{}: {}", context, msg))
            }
            other => other,
        }
    }

    /// `NotFound` and `SessionExpired` look the same to callers.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_) | AppError::SessionExpired)
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for AppError {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        AppError::PersistenceFailure(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::SessionExpired => (StatusCode::NOT_FOUND, "Session not found".to_string()),
            AppError::UpstreamUnavailable(_) | AppError::HttpError(_) => {
                (StatusCode::BAD_GATEWAY, "Upstream service unavailable".to_string())
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::StorageFailure(_)
            | AppError::PersistenceFailure(_)
            | AppError::InternalError(_) => {
                tracing::error!(error = %self, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
