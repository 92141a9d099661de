use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Message shared by both credential errors, so callers cannot tell an
/// unknown email from a wrong password.
const INVALID_EMAIL_OR_PASSWORD: &str = "Invalid email or password.";

/// JSON body of every error response.
#[must_use = "error responses do nothing unless serialized"]
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse<'a> {
    /// The error name/type identifier
    pub name: Cow<'a, str>,
    /// User-friendly error message safe for client display
    pub message: Cow<'a, str>,
    /// The resource that the error relates to (optional, set by handler)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Cow<'a, str>>,
    /// Additional context for debugging (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Cow<'a, str>>,
    /// HTTP status code (not serialized in JSON)
    #[serde(skip)]
    pub status: StatusCode,
}

impl<'a> ErrorResponse<'a> {
    // 4xx Client Errors
    pub const BAD_REQUEST: Self = Self::new(
        "bad_request",
        "The request could not be processed due to invalid data",
        StatusCode::BAD_REQUEST,
    );
    pub const INVALID_ACCOUNT_DETAILS: Self = Self::new(
        "invalid_account_details",
        INVALID_EMAIL_OR_PASSWORD,
        StatusCode::BAD_REQUEST,
    );
    pub const INVALID_CREDENTIALS: Self = Self::new(
        "invalid_credentials",
        INVALID_EMAIL_OR_PASSWORD,
        StatusCode::UNAUTHORIZED,
    );
    pub const NOT_FOUND: Self = Self::new(
        "not_found",
        "The requested resource was not found",
        StatusCode::NOT_FOUND,
    );
    pub const PAYLOAD_TOO_LARGE: Self = Self::new(
        "payload_too_large",
        "The request or the data it produces exceeds the size limit",
        StatusCode::PAYLOAD_TOO_LARGE,
    );
    // 5xx Server Errors
    pub const INTERNAL_SERVER_ERROR: Self = Self::new(
        "internal_server_error",
        "An internal server error occurred. Please try again later",
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    pub const SERVICE_UNAVAILABLE: Self = Self::new(
        "service_unavailable",
        "A backing service is temporarily unavailable. Please try again later",
        StatusCode::SERVICE_UNAVAILABLE,
    );

    /// Creates a new error response.
    #[inline]
    pub const fn new(name: &'a str, message: &'a str, status: StatusCode) -> Self {
        Self {
            name: Cow::Borrowed(name),
            message: Cow::Borrowed(message),
            resource: None,
            context: None,
            status,
        }
    }

    /// Sets the resource, joining it to an existing one with `/`.
    pub fn with_resource(mut self, resource: impl Into<Cow<'a, str>>) -> Self {
        let new_resource = resource.into();
        self.resource = Some(match self.resource {
            Some(existing) => Cow::Owned(format!("{}/{}", existing, new_resource)),
            None => new_resource,
        });
        self
    }

    /// Appends a sentence to the message.
    pub fn with_message(mut self, message: impl Into<Cow<'a, str>>) -> Self {
        let new_message = message.into();
        self.message = Cow::Owned(format!("{}. {}", self.message, new_message));
        self
    }

    /// Attaches context, joining it to existing context with `; `.
    pub fn with_context(mut self, context: impl Into<Cow<'a, str>>) -> Self {
        let new_context = context.into();
        self.context = Some(match self.context {
            Some(existing) => Cow::Owned(format!("{}; {}", existing, new_context)),
            None => new_context,
        });
        self
    }
}

impl Default for ErrorResponse<'_> {
    #[inline]
    fn default() -> Self {
        Self::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ErrorResponse<'_> {
    #[inline]
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
