//! Service-level error types.

use std::borrow::Cow;

/// Type alias for boxed errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for service operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of service-level errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Configuration validation or loading error.
    Config,
    /// Storage backend error (blobs, profiles, shares).
    Storage,
    /// Message queue error.
    Queue,
    /// Password hashing or verification error.
    Auth,
    /// Internal error (task join failures, unexpected states).
    Internal,
}

impl ErrorKind {
    /// Returns the error kind as a string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Storage => "storage",
            Self::Queue => "queue",
            Self::Auth => "auth",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for service operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    #[source]
    source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Creates a queue error.
    pub fn queue(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Queue, message)
    }

    /// Creates an authentication error.
    pub fn auth(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Auth, message)
    }

    /// Creates an internal error for the named component.
    pub fn internal(component: &str, message: impl AsRef<str>) -> Self {
        Self::new(
            ErrorKind::Internal,
            format!("{component}: {}", message.as_ref()),
        )
    }

    /// Attaches a source error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<storefront_core::Error> for Error {
    fn from(err: storefront_core::Error) -> Self {
        use storefront_core::ErrorKind as CoreKind;

        let kind = match err.kind {
            CoreKind::Configuration | CoreKind::InvalidInput => ErrorKind::Config,
            CoreKind::Queue => ErrorKind::Queue,
            CoreKind::Internal => ErrorKind::Internal,
            CoreKind::NotFound
            | CoreKind::PermissionDenied
            | CoreKind::LimitExceeded
            | CoreKind::Storage
            | CoreKind::Serialization
            | CoreKind::Timeout => ErrorKind::Storage,
        };

        Self::new(kind, err.to_string()).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind() {
        let err = Error::config("cart container name cannot be empty");
        assert_eq!(
            err.to_string(),
            "config error: cart container name cannot be empty"
        );
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn internal_names_component() {
        let err = Error::internal("pipeline", "worker panicked");
        assert_eq!(err.message(), "pipeline: worker panicked");
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn with_source_is_exposed() {
        let io = std::io::Error::other("disk full");
        let err = Error::storage("write failed").with_source(io);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn core_errors_are_classified() {
        let err: Error = storefront_core::Error::queue().with_message("nak").into();
        assert_eq!(err.kind(), ErrorKind::Queue);

        let err: Error = storefront_core::Error::not_found().into();
        assert_eq!(err.kind(), ErrorKind::Storage);

        let err: Error = storefront_core::Error::configuration().into();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
