//! Error types for the upload engine

use thiserror::Error;
use uplift_core::TransitionError;

/// Errors returned to callers of the store.
///
/// Transfer failures never show up here; they are recorded on the affected
/// file's record instead.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Uploader not found: {0}")]
    UploaderNotFound(String),

    #[error("Upload record not found: {0}")]
    RecordNotFound(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for store operations
pub type UploadResult<T> = Result<T, UploadError>;

/// Strategy-level transfer failure.
///
/// The display form is prefixed with the backend that failed so operators can
/// tell a proxy problem from a direct-storage problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("Presigned URL upload failed: {0}")]
    Proxy(String),

    #[error("S3 upload failed: {0}")]
    S3(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_error_is_prefixed_by_backend() {
        assert_eq!(
            TransferError::Proxy("quota exceeded".to_string()).to_string(),
            "Presigned URL upload failed: quota exceeded"
        );
        assert_eq!(
            TransferError::S3("AccessDenied".to_string()).to_string(),
            "S3 upload failed: AccessDenied"
        );
    }
}
