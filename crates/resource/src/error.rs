use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, FhirError>;

/// FHIR resource and server error types
#[derive(Debug, Error)]
pub enum FhirError {
    /// Raised before any I/O when a caller passes unusable arguments.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid resource: {0}")]
    Invalid(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
