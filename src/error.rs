//! Error types for the filesystem service layer
//!
//! Every public operation returns [`Result`]. OS-level failures are
//! translated into [`ServiceError`] variants carrying the offending path in
//! the message, so callers never need to reconstruct context from a bare
//! errno.

use std::path::Path;
use thiserror::Error;

/// Result type for all service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors produced by the filesystem service
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServiceError {
    /// Path input failed validation (empty, interior NUL, absolute segment, ...)
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Path resolves outside the service boundary
    #[error("path escapes the service boundary: {0}")]
    BoundaryViolation(String),

    /// Extended attribute operation failed
    #[error("extended attribute operation failed: {0}")]
    Xattr(String),

    /// Temporary resource creation, use, or cleanup failed
    #[error("temporary resource operation failed: {0}")]
    Temp(String),

    /// Chunked streaming read/write failed
    #[error("streaming I/O failed: {0}")]
    Stream(String),

    /// The target path does not exist
    #[error("path not found: {0}")]
    NotFound(String),

    /// General filesystem operation failure
    #[error("filesystem operation failed: {0}")]
    Io(String),

    /// Service configuration rejected by validation
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Create an invalid-path error
#[must_use]
pub fn invalid_path_error(message: &str) -> ServiceError {
    ServiceError::InvalidPath(message.to_string())
}

/// Create a boundary-violation error
#[must_use]
pub fn boundary_error(message: &str) -> ServiceError {
    ServiceError::BoundaryViolation(message.to_string())
}

/// Create an extended-attribute error
#[must_use]
pub fn xattr_error(message: &str) -> ServiceError {
    ServiceError::Xattr(message.to_string())
}

/// Create a temporary-resource error
#[must_use]
pub fn temp_error(message: &str) -> ServiceError {
    ServiceError::Temp(message.to_string())
}

/// Create a streaming error
#[must_use]
pub fn stream_error(message: &str) -> ServiceError {
    ServiceError::Stream(message.to_string())
}

/// Create a general I/O error
#[must_use]
pub fn io_error(message: &str) -> ServiceError {
    ServiceError::Io(message.to_string())
}

/// Create a configuration error
#[must_use]
pub fn config_error(message: &str) -> ServiceError {
    ServiceError::Config(message.to_string())
}

/// Translate an `std::io::Error` for an operation on `path`
///
/// `ErrorKind::NotFound` maps to [`ServiceError::NotFound`]; everything else
/// becomes [`ServiceError::Io`] with the operation and path in the message.
#[must_use]
pub fn translate_io_error(operation: &str, path: &Path, error: &std::io::Error) -> ServiceError {
    if error.kind() == std::io::ErrorKind::NotFound {
        ServiceError::NotFound(path.display().to_string())
    } else {
        ServiceError::Io(format!("{operation} failed for {}: {error}", path.display()))
    }
}
