//! JSON extractor with improved error handling.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Json as AxumJson, OptionalFromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use derive_more::{Deref, DerefMut, From};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::handler::{Error, ErrorKind};

/// Wrapper around [`axum::Json`] whose rejections are [`Error`]s.
///
/// Malformed bodies produce a `400 bad_request` with a short, sanitized
/// description of what failed instead of axum's plain-text rejection.
///
/// As an `Option<Json<T>>` extractor, client errors (missing content type,
/// syntax or data errors) yield `None` so handlers can answer them with their
/// own message.
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Creates a new [`Json`] wrapper around the provided value.
    #[inline]
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    /// Returns the inner value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extractor = <AxumJson<T> as FromRequest<S>>::from_request(req, state).await;
        extractor.map(|x| Self::new(x.0)).map_err(Into::into)
    }
}

impl<T, S> OptionalFromRequest<S> for Json<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        match <Self as FromRequest<S>>::from_request(req, state).await {
            Ok(json) => Ok(Some(json)),
            Err(error) => match error.kind() {
                ErrorKind::InternalServerError | ErrorKind::PayloadTooLarge => Err(error),
                _ => Ok(None),
            },
        }
    }
}

impl<T> IntoResponse for Json<T>
where
    T: Serialize,
{
    #[inline]
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}

impl From<JsonRejection> for Error<'static> {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => ErrorKind::BadRequest
                .with_message("Invalid request data format")
                .with_context(format!(
                    "JSON deserialization failed: {}",
                    sanitize_error_message(&err.body_text())
                )),
            JsonRejection::JsonSyntaxError(err) => ErrorKind::BadRequest
                .with_message("Invalid JSON syntax in request body")
                .with_context(format!(
                    "JSON parsing failed: {}",
                    sanitize_error_message(&err.body_text())
                )),
            JsonRejection::MissingJsonContentType(_) => ErrorKind::BadRequest
                .with_message("Invalid content type")
                .with_context("Request must have Content-Type header set to 'application/json'"),
            JsonRejection::BytesRejection(err) => {
                if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    ErrorKind::PayloadTooLarge.into_error()
                } else {
                    ErrorKind::BadRequest
                        .with_message("Failed to read request body")
                        .with_context(sanitize_error_message(&err.body_text()))
                }
            }
            other => ErrorKind::InternalServerError
                .with_message("Request processing failed")
                .with_context(sanitize_error_message(&other.body_text())),
        }
    }
}

/// Keeps the first three lines of a rejection message, capped at 200 characters.
fn sanitize_error_message(message: &str) -> String {
    let lines = message.lines().take(3).collect::<Vec<_>>();
    lines.join(" ").chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_truncates_long_messages() {
        let long = "x".repeat(500);
        assert_eq!(sanitize_error_message(&long).len(), 200);
    }

    #[test]
    fn sanitize_keeps_three_lines() {
        let message = "one\ntwo\nthree\nfour";
        assert_eq!(sanitize_error_message(message), "one two three");
    }
}
