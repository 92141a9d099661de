//! HTTP error handling with builder pattern for dynamic error responses.

use std::borrow::Cow;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::handler::response::ErrorResponse;

/// The error type for HTTP handlers in the server.
///
/// Carries an [`ErrorKind`] that fixes the status code and default message,
/// plus optional details appended to the JSON body.
#[derive(Clone)]
#[must_use = "errors do nothing unless serialized"]
pub struct Error<'a> {
    kind: ErrorKind,
    context: Option<Cow<'a, str>>,
    message: Option<Cow<'a, str>>,
    resource: Option<Cow<'a, str>>,
}

impl Error<'static> {
    /// Creates a new [`Error`] with the specified kind.
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
            message: None,
            resource: None,
        }
    }
}

impl<'a> Error<'a> {
    /// Attaches context information to the error.
    #[inline]
    pub fn with_context(self, context: impl Into<Cow<'a, str>>) -> Self {
        Self {
            context: Some(context.into()),
            ..self
        }
    }

    /// Sets an additional message, appended to the kind's default message.
    #[inline]
    pub fn with_message(self, message: impl Into<Cow<'a, str>>) -> Self {
        Self {
            message: Some(message.into()),
            ..self
        }
    }

    /// Sets the resource that caused the error.
    #[inline]
    pub fn with_resource(self, resource: impl Into<Cow<'a, str>>) -> Self {
        Self {
            resource: Some(resource.into()),
            ..self
        }
    }

    /// Returns the error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the context if present.
    #[inline]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Returns the custom message if present.
    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the resource if present.
    #[inline]
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    /// Converts this error into a static version by cloning all borrowed data.
    pub fn into_static(self) -> Error<'static> {
        Error {
            kind: self.kind,
            context: self.context.map(|c| Cow::Owned(c.into_owned())),
            message: self.message.map(|m| Cow::Owned(m.into_owned())),
            resource: self.resource.map(|r| Cow::Owned(r.into_owned())),
        }
    }
}

impl Default for Error<'static> {
    #[inline]
    fn default() -> Self {
        Self::new(ErrorKind::default())
    }
}

impl fmt::Debug for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let response = self.kind.response();

        let mut debug_struct = f.debug_struct("Error");
        debug_struct
            .field("kind", &self.kind)
            .field("name", &response.name)
            .field("status", &response.status);

        if let Some(ref context) = self.context {
            debug_struct.field("context", context);
        }

        if let Some(ref message) = self.message {
            debug_struct.field("custom_message", message);
        }

        if let Some(ref resource) = self.resource {
            debug_struct.field("custom_resource", resource);
        }

        debug_struct.finish()
    }
}

impl fmt::Display for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let response = self.kind.response();
        let message = self.message.as_deref().unwrap_or(response.message.as_ref());

        write!(f, "{} ({}): {}", response.name, response.status, message)?;

        if let Some(ref context) = self.context {
            write!(f, " - {}", context)?;
        }

        if let Some(ref resource) = self.resource {
            write!(f, " [resource: {}]", resource)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error<'_> {}

impl IntoResponse for Error<'_> {
    fn into_response(self) -> Response {
        let mut response = self.kind.response();

        if let Some(message) = self.message {
            response = response.with_message(message);
        }

        if let Some(resource) = self.resource {
            response = response.with_resource(resource);
        }

        if let Some(context) = self.context {
            response = response.with_context(context);
        }

        response.into_response()
    }
}

impl From<ErrorKind> for Error<'static> {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// A specialized [`Result`] type for HTTP handlers.
///
/// [`Result`]: std::result::Result
pub type Result<T, E = Error<'static>> = std::result::Result<T, E>;

/// Enumeration of the HTTP error kinds the API can return.
#[must_use = "error kinds do nothing unless used to create errors"]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // 4xx Client Errors
    /// 400 Bad Request - Invalid request data
    BadRequest,
    /// 400 Bad Request - Registration payload missing or malformed
    InvalidAccountDetails,
    /// 401 Unauthorized - Unknown email or wrong password
    InvalidCredentials,
    /// 404 Not Found - Resource not found
    NotFound,
    /// 413 Payload Too Large - Request body over the size limit
    PayloadTooLarge,

    // 5xx Server Errors
    /// 500 Internal Server Error - Unexpected server error
    #[default]
    InternalServerError,
    /// 503 Service Unavailable - Storage or queue backend unavailable
    ServiceUnavailable,
}

impl ErrorKind {
    /// Converts this error kind into a full [`Error`].
    #[inline]
    pub fn into_error(self) -> Error<'static> {
        Error::new(self)
    }

    /// Creates an [`Error`] with the specified context.
    #[inline]
    pub fn with_context<'a>(self, context: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_context(context)
    }

    /// Creates an [`Error`] with the specified message.
    #[inline]
    pub fn with_message<'a>(self, message: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_message(message)
    }

    /// Creates an [`Error`] with the specified resource.
    #[inline]
    pub fn with_resource<'a>(self, resource: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_resource(resource)
    }

    /// Returns the HTTP status code for this error kind.
    #[inline]
    pub fn status_code(self) -> StatusCode {
        self.response().status
    }

    /// Returns the response template of this error kind.
    #[inline]
    pub fn response(self) -> ErrorResponse<'static> {
        match self {
            Self::BadRequest => ErrorResponse::BAD_REQUEST,
            Self::InvalidAccountDetails => ErrorResponse::INVALID_ACCOUNT_DETAILS,
            Self::InvalidCredentials => ErrorResponse::INVALID_CREDENTIALS,
            Self::NotFound => ErrorResponse::NOT_FOUND,
            Self::PayloadTooLarge => ErrorResponse::PAYLOAD_TOO_LARGE,
            Self::InternalServerError => ErrorResponse::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => ErrorResponse::SERVICE_UNAVAILABLE,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.response().name.as_ref())
    }
}

impl IntoResponse for ErrorKind {
    #[inline]
    fn into_response(self) -> Response {
        self.response().into_response()
    }
}
