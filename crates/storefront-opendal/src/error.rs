//! Storage error types.

use storefront_core::ErrorKind;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to initialize the storage backend.
    #[error("storage initialization failed: {0}")]
    Init(String),

    /// File or object not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Permission denied.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A file would grow past its size limit.
    #[error("size limit exceeded: {0}")]
    LimitExceeded(String),

    /// Read operation failed.
    #[error("read failed: {0}")]
    Read(String),

    /// Metadata could not be encoded or decoded.
    #[error("metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    /// Backend-specific error.
    #[error("backend error: {0}")]
    Backend(opendal::Error),
}

impl StorageError {
    /// Creates a new initialization error.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Creates a new size limit error.
    pub fn limit_exceeded(msg: impl Into<String>) -> Self {
        Self::LimitExceeded(msg.into())
    }

    /// Creates a new read error.
    pub fn read(msg: impl Into<String>) -> Self {
        Self::Read(msg.into())
    }

    /// Returns the capability error kind this error maps to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Init(_) => ErrorKind::Configuration,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::LimitExceeded(_) => ErrorKind::LimitExceeded,
            Self::Metadata(_) => ErrorKind::Serialization,
            Self::Read(_) | Self::Backend(_) => ErrorKind::Storage,
        }
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        use opendal::ErrorKind;

        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(err.to_string()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            _ => Self::Backend(err),
        }
    }
}

impl From<StorageError> for storefront_core::Error {
    fn from(err: StorageError) -> Self {
        storefront_core::Error::new(err.kind())
            .with_message(err.to_string())
            .with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opendal_not_found_is_mapped() {
        let err: StorageError =
            opendal::Error::new(opendal::ErrorKind::NotFound, "cart/missing.json").into();

        assert!(matches!(err, StorageError::NotFound(_)));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn backend_errors_are_transient() {
        let err: storefront_core::Error = StorageError::from(opendal::Error::new(
            opendal::ErrorKind::Unexpected,
            "connection reset",
        ))
        .into();

        assert_eq!(err.kind, ErrorKind::Storage);
        assert!(err.is_transient());
    }

    #[test]
    fn limit_is_not_transient() {
        let err: storefront_core::Error = StorageError::limit_exceeded("report.txt").into();
        assert_eq!(err.kind, ErrorKind::LimitExceeded);
        assert!(!err.is_transient());
    }
}
