//! Domain-specific error types

use thiserror::Error;

/// Domain-level errors for scan submission and job lifecycle
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid target URL: {reason}")]
    InvalidTarget { reason: String },

    #[error("At least one scan type must be requested")]
    EmptyProbeSet,

    #[error("Invalid input for field {field}: {message}")]
    InvalidInput { field: String, message: String },
}
