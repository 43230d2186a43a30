/// Gateway error types and handling utilities
use axum::http::StatusCode;

/// Main error type for gateway operations
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The sandbox container does not exist
    #[error("Container '{container}' not found. Is the sandbox running?")]
    ContainerNotFound { container: String },
    /// Request shape or path failed validation
    #[error("Validation error: {reason}")]
    Validation { reason: String },
    /// Requested file or variable is absent
    #[error("Not found: {what}")]
    NotFound { what: String },
    /// Request is well-formed but cannot be served as asked
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },
    /// Container engine call failed for reasons other than absence
    #[error("Transport error in {operation}: {reason}")]
    Transport { operation: String, reason: String },
    /// Environment file I/O failed
    #[error("Storage error in {operation}: {reason}")]
    Storage { operation: String, reason: String },
    /// Wrapped anyhow error for anything unexpected
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    pub fn transport(operation: impl Into<String>, reason: impl ToString) -> Self {
        Self::Transport {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    pub fn storage(operation: impl Into<String>, reason: impl ToString) -> Self {
        Self::Storage {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }
}

/// HTTP status an error maps to when it reaches the transport layer
pub fn status_code(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::ContainerNotFound { .. } => StatusCode::NOT_FOUND,
        GatewayError::Validation { .. } => StatusCode::BAD_REQUEST,
        GatewayError::NotFound { .. } => StatusCode::NOT_FOUND,
        GatewayError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
        GatewayError::Transport { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        GatewayError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        GatewayError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
