// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Media upload failed: {0}")]
    Upload(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upload(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// JSON error envelope: `{ statusCode, message, success: false, errors: [...] }`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope {
    status_code: u16,
    message: String,
    success: bool,
    errors: Vec<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (message, errors) = match &self {
            AppError::Unauthorized => ("Authentication required".to_string(), vec![]),
            AppError::InvalidToken => ("Invalid or expired token".to_string(), vec![]),
            AppError::NotFound(msg) => ("Resource not found".to_string(), vec![msg.clone()]),
            AppError::Validation(msg) => ("Invalid request".to_string(), vec![msg.clone()]),
            AppError::Conflict(msg) => ("Conflict".to_string(), vec![msg.clone()]),
            AppError::Upload(msg) => {
                tracing::error!(error = %msg, "Media upload error");
                ("Media upload failed".to_string(), vec![])
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                ("Internal server error".to_string(), vec![])
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                ("Internal server error".to_string(), vec![])
            }
        };

        let body = ErrorEnvelope {
            status_code: status.as_u16(),
            message,
            success: false,
            errors,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
