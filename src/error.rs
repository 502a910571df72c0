//! Error types for the driver cache service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == App Error Enum ==
/// Unified error type for the driver cache service.
#[derive(Error, Debug)]
pub enum AppError {
    /// Cache backend unreachable or rejected a command
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// Value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Requested driver does not exist
    #[error("{0}")]
    NotFound(String),

    /// Relational store failure
    #[error("Store error: {0}")]
    Store(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == Conversions ==
impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::CacheUnavailable(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(msg) => {
                return (StatusCode::NOT_FOUND, msg.clone()).into_response();
            }
            AppError::CacheUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Serialization(_) | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the driver cache service.
pub type Result<T> = std::result::Result<T, AppError>;
