use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid validity duration: {0}")]
    InvalidDuration(String),

    #[error("Invalid short code: {0}")]
    InvalidShortCode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Short code already exists: {0}")]
    DuplicateCode(String),

    #[error("Short code allocation exhausted after {0} attempts")]
    AllocationExhausted(u32),

    #[error("Short link not found: {0}")]
    NotFound(String),

    #[error("Short link expired: {0}")]
    Expired(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidUrl(_) => "INVALID_URL",
            AppError::InvalidDuration(_) => "INVALID_DURATION",
            AppError::InvalidShortCode(_) => "INVALID_SHORT_CODE",
            AppError::InvalidRequest(_) => "INVALID_REQUEST",
            AppError::DuplicateCode(_) => "CODE_EXISTS",
            AppError::AllocationExhausted(_) => "ALLOCATION_EXHAUSTED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Expired(_) => "EXPIRED",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Configuration(_) | AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidUrl(_)
            | AppError::InvalidDuration(_)
            | AppError::InvalidShortCode(_)
            | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateCode(_) => StatusCode::CONFLICT,
            AppError::AllocationExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Expired(_) => StatusCode::GONE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to clients. Server-side failures are logged and masked.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {:?}", e);
                "Data serialization error".to_string()
            }
            AppError::Io(e) => {
                tracing::error!("I/O error: {:?}", e);
                "Storage error occurred".to_string()
            }
            AppError::Configuration(_) | AppError::Internal(_) => {
                tracing::error!("Internal error: {}", self);
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.code(),
            "message": self.public_message(),
        });

        (self.status_code(), Json(body)).into_response()
    }
}

/// Result type alias for AppResult
pub type AppResult<T> = Result<T, AppError>;
