//! Common error type definitions.

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors returned by storage and queue capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Input validation failed.
    InvalidInput,
    /// Container, table, share or object does not exist.
    NotFound,
    /// Caller lacks permission on the backing store.
    PermissionDenied,
    /// Storage quota or size limit reached.
    LimitExceeded,
    /// Backing store failed to read or write.
    Storage,
    /// Message transport failed to publish, fetch or settle.
    Queue,
    /// Serialization/deserialization error.
    Serialization,
    /// Configuration error.
    Configuration,
    /// Timeout occurred.
    Timeout,
    /// Internal error.
    Internal,
}

/// A structured error type for capability operations.
#[derive(Debug, Error)]
#[error("{}{}", kind.as_ref(), message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Adds an already boxed source error to this error.
    pub fn with_boxed_source(mut self, source: BoxedError) -> Self {
        self.source = Some(source);
        self
    }

    /// Creates a new invalid input error.
    pub fn invalid_input() -> Self {
        Self::new(ErrorKind::InvalidInput)
    }

    /// Creates a new not found error.
    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound)
    }

    /// Creates a new storage error.
    pub fn storage() -> Self {
        Self::new(ErrorKind::Storage)
    }

    /// Creates a new queue error.
    pub fn queue() -> Self {
        Self::new(ErrorKind::Queue)
    }

    /// Creates a new serialization error.
    pub fn serialization() -> Self {
        Self::new(ErrorKind::Serialization)
    }

    /// Creates a new configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Creates a new internal error.
    pub fn internal() -> Self {
        Self::new(ErrorKind::Internal)
    }

    /// Returns true if retrying the operation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Storage | ErrorKind::Queue | ErrorKind::Timeout
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization()
            .with_message(err.to_string())
            .with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let error = Error::not_found().with_message("container 'cart'");
        assert_eq!(error.to_string(), "not_found: container 'cart'");
    }

    #[test]
    fn display_without_message() {
        assert_eq!(Error::queue().to_string(), "queue");
    }

    #[test]
    fn transient_kinds() {
        assert!(Error::storage().is_transient());
        assert!(Error::queue().is_transient());
        assert!(!Error::invalid_input().is_transient());
        assert!(!Error::configuration().is_transient());
    }

    #[test]
    fn source_is_preserved() {
        let io = std::io::Error::other("disk full");
        let error = Error::storage().with_source(io);
        assert!(std::error::Error::source(&error).is_some());
    }
}
