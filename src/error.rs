//! Gateway error taxonomy and its HTTP mapping.
//!
//! # Design Decisions
//! - Upstream application errors are never represented here; they are relayed verbatim
//! - Detail text is only exposed to clients in development mode
//! - Every variant maps to a stable client-facing message

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the gateway itself.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The service has no healthy instance (or is unknown).
    #[error("No healthy instances available for service: {0}")]
    NoHealthyInstance(String),

    /// The outbound call did not complete in time.
    #[error("Upstream request timed out after {0:?}")]
    UpstreamTimeout(Duration),

    /// Connection refused, DNS failure, reset, etc.
    #[error("Upstream transport error: {0}")]
    Transport(String),

    /// The selected instance URL and path did not form a valid URI.
    #[error("Invalid upstream target: {0}")]
    InvalidUpstream(String),

    /// A required request field was absent or empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The request body or path could not be decoded.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A supplied service URL could not be parsed.
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),

    /// The named service group does not exist.
    #[error("Service not found: {0}")]
    UnknownService(String),

    /// The guard rejected the request.
    #[error("Unauthorized")]
    Unauthorized,

    /// No gateway route matched the request path.
    #[error("Route not found")]
    RouteNotFound,
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::NoHealthyInstance(_)
            | GatewayError::UpstreamTimeout(_)
            | GatewayError::Transport(_)
            | GatewayError::InvalidUpstream(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::MissingField(_)
            | GatewayError::InvalidRequest(_)
            | GatewayError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            GatewayError::UnknownService(_) | GatewayError::RouteNotFound => StatusCode::NOT_FOUND,
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    /// Stable message shown to clients regardless of mode.
    pub fn public_message(&self) -> String {
        match self {
            GatewayError::NoHealthyInstance(_)
            | GatewayError::UpstreamTimeout(_)
            | GatewayError::Transport(_)
            | GatewayError::InvalidUpstream(_) => "Service unavailable".to_string(),
            // Validation errors are the caller's own input, always safe to echo.
            GatewayError::MissingField(_)
            | GatewayError::InvalidRequest(_)
            | GatewayError::InvalidUrl(_)
            | GatewayError::UnknownService(_) => self.to_string(),
            GatewayError::Unauthorized => "Unauthorized".to_string(),
            GatewayError::RouteNotFound => "Route not found".to_string(),
        }
    }
}

/// Client-facing error payload.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A [`GatewayError`] bound to the detail-visibility of the running mode.
#[derive(Debug)]
pub struct ApiError {
    pub error: GatewayError,
    pub expose_detail: bool,
}

impl ApiError {
    pub fn new(error: GatewayError, expose_detail: bool) -> Self {
        Self { error, expose_detail }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.error.public_message(),
            error: self.expose_detail.then(|| self.error.to_string()),
        };
        (self.error.status_code(), Json(body)).into_response()
    }
}
