// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::services::payload::ParseError;
use crate::services::pipeline::PipelineError;
use crate::services::validation::FieldError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{error}: {details}")]
    Validation { error: String, details: String },

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("Check-in failed: {0}")]
    CheckIn(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a validation failure with an explicit message pair.
    pub fn validation(error: impl Into<String>, details: impl Into<String>) -> Self {
        AppError::Validation {
            error: error.into(),
            details: details.into(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(rejection.body_text())
        } else {
            AppError::InvalidBody(rejection.body_text())
        }
    }
}

impl From<FieldError> for AppError {
    fn from(err: FieldError) -> Self {
        AppError::validation(err.to_string(), err.details())
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Parse(e) => AppError::Parse(e),
            PipelineError::Validation(e) => e.into(),
            PipelineError::Store(e) => AppError::Store(e.to_string()),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details, timestamp) = match self {
            AppError::Validation { error, details } => {
                (StatusCode::BAD_REQUEST, error, Some(details), None)
            }
            AppError::InvalidBody(msg) => (
                StatusCode::BAD_REQUEST,
                "Invalid request body".to_string(),
                Some(msg),
                None,
            ),
            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large".to_string(),
                Some(msg),
                None,
            ),
            AppError::Parse(err) => (
                StatusCode::BAD_REQUEST,
                "Invalid QR code format".to_string(),
                Some(err.to_string()),
                None,
            ),
            AppError::CheckIn(msg) => {
                tracing::error!(error = %msg, "Check-in process failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Check-in failed".to_string(),
                    Some(msg),
                    Some(crate::time_utils::format_utc_rfc3339(chrono::Utc::now())),
                )
            }
            AppError::Store(msg) => {
                tracing::error!(error = %msg, "Submission store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                    None,
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                    None,
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            error,
            details,
            timestamp,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
