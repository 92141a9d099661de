//! Capability error to HTTP error conversion.

use storefront_core::ErrorKind as CoreErrorKind;

use super::http_error::{Error as HttpError, ErrorKind};

/// Tracing target for capability error conversions.
const TRACING_TARGET: &str = "storefront_server::handler::core";

impl From<storefront_core::Error> for HttpError<'static> {
    fn from(error: storefront_core::Error) -> Self {
        match error.kind {
            CoreErrorKind::InvalidInput => {
                tracing::warn!(target: TRACING_TARGET, error = %error, "Invalid input");
                ErrorKind::BadRequest.into_error()
            }
            CoreErrorKind::NotFound => ErrorKind::NotFound.into_error(),
            CoreErrorKind::LimitExceeded => {
                tracing::warn!(target: TRACING_TARGET, error = %error, "Storage limit reached");
                ErrorKind::PayloadTooLarge.into_error()
            }
            CoreErrorKind::Storage | CoreErrorKind::Queue | CoreErrorKind::Timeout => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    error_kind = ?error.kind,
                    "Backend unavailable"
                );
                ErrorKind::ServiceUnavailable.into_error()
            }
            CoreErrorKind::PermissionDenied
            | CoreErrorKind::Serialization
            | CoreErrorKind::Configuration
            | CoreErrorKind::Internal => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    error_kind = ?error.kind,
                    "Backend operation failed"
                );
                ErrorKind::InternalServerError.into_error()
            }
        }
    }
}
