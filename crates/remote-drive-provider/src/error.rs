//! Provider error types.

use remote_drive_core::SessionError;
use thiserror::Error;

/// Provider error.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Remote execution failed: {0}")]
    Session(#[from] SessionError),
    #[error("Operation not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("Malformed result: field {field}: {detail}")]
    MalformedResult { field: &'static str, detail: String },
    #[error("Missing drive parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Drive not found: {0}")]
    DriveNotFound(String),
    #[error("Drive already exists: {0}")]
    DriveExists(String),
}

impl ProviderError {
    pub(crate) fn malformed(field: &'static str, detail: impl Into<String>) -> Self {
        Self::MalformedResult {
            field,
            detail: detail.into(),
        }
    }
}

/// Provider result type.
pub type ProviderResult<T> = Result<T, ProviderError>;
