//! Recovery middleware for handling errors, panics, and timeouts.

use std::any::Any;
use std::future::ready;
use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::response::{IntoResponse, Response};
#[cfg(feature = "config")]
use clap::Args;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower_http::catch_panic::CatchPanicLayer;

use crate::handler::{Error, ErrorKind};

/// Tracing target for error recovery.
const TRACING_TARGET_ERROR: &str = "storefront_server::recovery::error";

/// Tracing target for panic recovery.
const TRACING_TARGET_PANIC: &str = "storefront_server::recovery::panic";

type ResponseFut = BoxFuture<'static, Response>;
type Panic = Box<dyn Any + Send + 'static>;

/// Configuration for recovery middleware behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct RecoveryConfig {
    /// Seconds to wait for a request to complete before answering with an error
    #[cfg_attr(
        feature = "config",
        arg(long, env = "REQUEST_TIMEOUT", default_value = "30")
    )]
    pub request_timeout: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            request_timeout: 30,
        }
    }
}

impl RecoveryConfig {
    /// Creates a new configuration with the specified request timeout in seconds.
    pub fn with_timeout_secs(secs: u64) -> Self {
        Self {
            request_timeout: secs,
        }
    }

    /// Returns the request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// Extension trait for `axum::`[`Router`] to apply recovery middleware.
pub trait RouterRecoveryExt<S> {
    /// Layers timeout, panic and service error recovery.
    fn with_recovery(self, config: &RecoveryConfig) -> Self;

    /// Layers recovery middleware with a 30-second timeout.
    fn with_default_recovery(self) -> Self;
}

impl<S> RouterRecoveryExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_recovery(self, config: &RecoveryConfig) -> Self {
        let middlewares = ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_error))
            .layer(CatchPanicLayer::custom(catch_panic))
            .layer(TimeoutLayer::new(config.request_timeout()));

        self.layer(middlewares)
    }

    fn with_default_recovery(self) -> Self {
        self.with_recovery(&RecoveryConfig::default())
    }
}

fn handle_error(err: tower::BoxError) -> ResponseFut {
    use tower::timeout::error::Elapsed;

    let error = if err.downcast_ref::<Elapsed>().is_some() {
        tracing::error!(
            target: TRACING_TARGET_ERROR,
            error = %err,
            "Request timeout exceeded"
        );

        ErrorKind::ServiceUnavailable
            .with_message("Request timeout")
            .with_context("The request took too long to process and was terminated")
    } else {
        tracing::error!(
            target: TRACING_TARGET_ERROR,
            error = %err,
            "Unknown middleware error"
        );

        ErrorKind::InternalServerError.with_context(err.to_string())
    };

    ready(error.into_response()).boxed()
}

fn catch_panic(err: Panic) -> Response {
    if let Some(error) = err.downcast_ref::<Error<'static>>() {
        tracing::error!(
            target: TRACING_TARGET_PANIC,
            error = %error,
            "Service panic"
        );
        return error.clone().into_response();
    }

    let message = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic type");

    tracing::error!(
        target: TRACING_TARGET_PANIC,
        message = %message,
        "Service panic"
    );

    ErrorKind::InternalServerError.into_response()
}
