//! Application layer error types

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::DomainError;

/// Application-level errors
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Unknown scan type: {name}")]
    UnknownProbeType { name: String },

    #[error("Scan not found: {id}")]
    NotFound { id: Uuid },

    #[error("Scan {id} has not finished yet")]
    NotTerminal { id: Uuid },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by job store implementations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt job record at {path}")]
    Corrupt { path: String },
}

/// Errors raised inside probe adapters. These never surface to API callers:
/// the orchestrator converts them into Failure outcome records at the
/// dispatch boundary.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DNS resolution failed for {host}")]
    DnsResolution { host: String },

    #[error("probe internal error: {message}")]
    Internal { message: String },
}

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApplicationError::Domain(domain_error) => match domain_error {
                DomainError::InvalidTarget { .. } => (StatusCode::BAD_REQUEST, self.to_string()),
                DomainError::EmptyProbeSet => (StatusCode::BAD_REQUEST, self.to_string()),
                DomainError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, self.to_string()),
            },
            ApplicationError::UnknownProbeType { .. } => (StatusCode::BAD_REQUEST, self.to_string()),
            ApplicationError::NotFound { .. } => (StatusCode::NOT_FOUND, self.to_string()),
            ApplicationError::NotTerminal { .. } => (StatusCode::CONFLICT, self.to_string()),
            ApplicationError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            ApplicationError::Json(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            ApplicationError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "type": self.error_type(),
                "status": status.as_u16()
            }
        }));

        (status, body).into_response()
    }
}

impl ApplicationError {
    /// Get the error type as a string for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            ApplicationError::Domain(DomainError::InvalidTarget { .. }) => "invalid_target",
            ApplicationError::Domain(DomainError::EmptyProbeSet) => "empty_probe_set",
            ApplicationError::Domain(DomainError::InvalidInput { .. }) => "invalid_input",
            ApplicationError::UnknownProbeType { .. } => "unknown_scan_type",
            ApplicationError::NotFound { .. } => "not_found",
            ApplicationError::NotTerminal { .. } => "scan_not_finished",
            ApplicationError::Store(_) => "store_error",
            ApplicationError::Json(_) => "json_error",
            ApplicationError::Io(_) => "io_error",
        }
    }
}
