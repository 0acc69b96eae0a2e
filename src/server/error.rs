//! HTTP error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::core::errors::TranslationError;

/// Errors surfaced by HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    /// Failure from the translator
    #[error(transparent)]
    Translation(#[from] TranslationError),

    /// Missing or wrong API key
    #[error("Invalid or missing API key")]
    Unauthorized,

    /// The blocking task panicked or was cancelled
    #[error("Translation worker failed: {0}")]
    Worker(String),
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Error payload
    pub error: ErrorDetail,
}

/// Error payload body
#[derive(Serialize)]
pub struct ErrorDetail {
    /// Human readable message
    pub message: String,
    /// Stable error kind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Error class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Translation(e) => match e.root() {
                TranslationError::InvalidArgument { .. }
                | TranslationError::Unsupported { .. } => StatusCode::BAD_REQUEST,
                TranslationError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "unauthorized",
            ApiError::Worker(_) => "unknown_internal",
            ApiError::Translation(e) => e.kind(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_type = if status.is_client_error() {
            "invalid_request_error"
        } else {
            "api_error"
        };

        if status.is_server_error() {
            warn!("Request failed: {}", self);
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                message: self.to_string(),
                code: Some(self.code().to_string()),
                r#type: Some(error_type.to_string()),
            },
        };

        (status, Json(body)).into_response()
    }
}
