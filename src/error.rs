use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use thiserror::Error;
use tracing::{error, warn};

use crate::translate::TranslateError;

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error("Request validation failed: {0}")]
    InvalidBody(#[from] JsonRejection),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error body shared by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub timestamp: String,
}

impl ErrorBody {
    fn new(error: &str, message: String, detail: Option<String>) -> Self {
        Self {
            error: error.to_string(),
            message,
            detail,
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Translate(TranslateError::Validation(e)) if e.is_language_error() => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Translate(TranslateError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Translate(TranslateError::UnsupportedPair { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Translate(TranslateError::ModelUnavailable { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Translate(TranslateError::Inference { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::InvalidBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            ApiError::Translate(TranslateError::Validation(e)) if e.is_language_error() => {
                ErrorBody::new("Unsupported Language Pair", e.to_string(), None)
            }
            ApiError::Translate(TranslateError::Validation(e)) => {
                ErrorBody::new("Validation Error", e.to_string(), None)
            }
            ApiError::Translate(e @ TranslateError::UnsupportedPair { .. }) => {
                ErrorBody::new("Unsupported Language Pair", e.to_string(), None)
            }
            ApiError::Translate(TranslateError::ModelUnavailable { pair, .. }) => ErrorBody::new(
                "Service Unavailable",
                format!("Translation model for {} is temporarily unavailable", pair),
                Some("Please retry later".to_string()),
            ),
            ApiError::Translate(TranslateError::Inference { .. }) => ErrorBody::new(
                "Translation Error",
                "Translation failed".to_string(),
                None,
            ),
            ApiError::InvalidBody(rejection) => ErrorBody::new(
                "Validation Error",
                "Request validation failed".to_string(),
                Some(rejection.body_text()),
            ),
            ApiError::Internal(_) => ErrorBody::new(
                "Internal Server Error",
                "An unexpected error occurred".to_string(),
                Some("Please contact support if the problem persists".to_string()),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{} response: {}", status, self.source_chain());
        } else {
            warn!("{} response: {}", status, self);
        }
        (status, Json(self.body())).into_response()
    }
}

/// Turn a handler panic into the generic 500 body.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::Internal(anyhow::anyhow!("handler panicked: {}", detail)).into_response()
}

impl ApiError {
    // Full error chain as text, for logs only.
    fn source_chain(&self) -> String {
        let mut parts = vec![self.to_string()];
        let mut source = std::error::Error::source(self);
        while let Some(e) = source {
            parts.push(e.to_string());
            source = e.source();
        }
        parts.join(": ")
    }
}
