//! Defines the application's error types and a convenience `Result` alias.
//!
//! - `AppError` covers startup and infrastructure failures (configuration, HTTP client
//!   construction, socket binding). Errors that do not implement `Clone` are wrapped in
//!   `Arc` to allow `AppError` to be cloneable.
//! - `ApiError` is the error taxonomy of the JSON endpoints. It converts itself into an
//!   HTTP response with a `{"error": ...}` body, so handlers can simply return it.

use crate::api::ProviderError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, warn};

/// The primary error enumeration for startup and infrastructure errors.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// Invalid or missing configuration value.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// Error building the outbound HTTP client (`reqwest`).
    #[error("HTTP Client Error: {0}")]
    HttpClient(Arc<reqwest::Error>),

    /// Error related to standard I/O operations (binding, serving).
    #[error("I/O Error: {0}")]
    Io(Arc<std::io::Error>),
}

/// A specialized `Result` type using the application's `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

// --- From implementations ---

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::HttpClient(Arc::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(Arc::new(err))
    }
}

/// Errors returned to the browser by the `/api/*` endpoints.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request body missing, malformed, or without a usable `city`.
    #[error("City name is required.")]
    InvalidInput,

    /// The provider reported no match. Carries the message shown to the client,
    /// which may be any JSON value the provider supplied.
    #[error("Station not found: {0}")]
    NotFound(Value),

    /// The provider could not be reached or answered with a non-success status.
    #[error("Failed to connect to the AQI service: {0}")]
    UpstreamUnavailable(String),

    /// Anything else that went wrong while handling the request.
    #[error("An unexpected error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The value placed under the `error` key of the response body.
    fn message(&self) -> Value {
        match self {
            ApiError::NotFound(detail) => detail.clone(),
            other => Value::String(other.to_string()),
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unavailable(details) => ApiError::UpstreamUnavailable(details),
            ProviderError::Internal(details) => ApiError::Internal(details),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            ApiError::Internal(_) | ApiError::UpstreamUnavailable(_) => {
                error!(status = status.as_u16(), "{}", self)
            },
            _ => warn!(status = status.as_u16(), "{}", self),
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}
