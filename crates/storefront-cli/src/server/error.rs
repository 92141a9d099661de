//! Server error types.

use std::io;

use thiserror::Error;

/// Result type for server operations.
pub type Result<T, E = ServerError> = std::result::Result<T, E>;

/// Errors raised while binding or running the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Server configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to bind to the specified address.
    #[error("Failed to bind to {address}: {source}")]
    BindError {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Runtime server error.
    #[error("Runtime error: {0}")]
    Runtime(#[source] io::Error),
}

impl ServerError {
    /// Returns a unique error code for this error type.
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "E001",
            Self::BindError { .. } => "E002",
            Self::Runtime(_) => "E003",
        }
    }

    /// Provides a human-readable suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::InvalidConfig(_) => {
                Some("Check the command-line flags and environment variables listed by --help")
            }
            Self::BindError { source, .. } => match source.kind() {
                io::ErrorKind::PermissionDenied => {
                    Some("Try using a port above 1024 or run with appropriate privileges")
                }
                io::ErrorKind::AddrInUse => Some(
                    "The port is already in use. Try a different port or stop the conflicting service",
                ),
                io::ErrorKind::AddrNotAvailable => {
                    Some("The address is not available. Check network interface configuration")
                }
                _ => Some("Check network configuration and firewall settings"),
            },
            Self::Runtime(err) => match err.kind() {
                io::ErrorKind::TimedOut => {
                    Some("The operation timed out, consider increasing timeout values")
                }
                _ => None,
            },
        }
    }
}
