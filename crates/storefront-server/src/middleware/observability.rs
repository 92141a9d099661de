//! Observability middleware for request tracing and timing.

use std::net::SocketAddr;
use std::time::Instant;

use axum::Router;
use axum::extract::{ConnectInfo, Request};
use axum::http::header;
use axum::middleware::{Next, from_fn};
use axum::response::Response;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;

/// Tracing target for request metrics.
const TRACING_TARGET_METRICS: &str = "storefront_server::metrics";

/// Header carrying the request ID.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Extension trait for `axum::`[`Router`] to apply observability middleware.
pub trait RouterObservabilityExt<S> {
    /// Layers request IDs, request tracing and sensitive header redaction.
    ///
    /// Every request gets an `x-request-id` (a UUID unless the client sent
    /// one), which is echoed on the response.
    fn with_observability(self) -> Self;

    /// Layers per-request timing and size logging.
    fn with_metrics(self) -> Self;
}

impl<S> RouterObservabilityExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_observability(self) -> Self {
        self.layer(PropagateRequestIdLayer::new(
            header::HeaderName::from_static(REQUEST_ID_HEADER),
        ))
        .layer(SetSensitiveRequestHeadersLayer::new([
            header::AUTHORIZATION,
            header::COOKIE,
        ]))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(
            header::HeaderName::from_static(REQUEST_ID_HEADER),
            MakeRequestUuid,
        ))
    }

    fn with_metrics(self) -> Self {
        self.layer(from_fn(track_request_metrics))
    }
}

/// Logs method, path, status, duration and body sizes of each request.
///
/// The client address is included when the server was started with
/// connection info.
pub async fn track_request_metrics(request: Request, next: Next) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default();
    let request_size = content_length(request.headers());

    tracing::trace!(
        target: TRACING_TARGET_METRICS,
        method = %method,
        path = %path,
        client_ip = %client_ip,
        request_size,
        "Request started"
    );

    let response = next.run(request).await;
    let duration = start_time.elapsed();

    tracing::debug!(
        target: TRACING_TARGET_METRICS,
        method = %method,
        path = %path,
        status = %response.status(),
        duration_ms = duration.as_millis() as u64,
        client_ip = %client_ip,
        request_size,
        response_size = content_length(response.headers()),
        "Request completed"
    );

    response
}

fn content_length(headers: &header::HeaderMap) -> u64 {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use axum::routing::get;
    use axum_test::TestServer;

    use super::*;

    #[tokio::test]
    async fn request_id_is_generated_and_propagated() -> anyhow::Result<()> {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .with_observability()
            .with_metrics();
        let server = TestServer::new(app)?;

        let generated = server.get("/").await;
        generated.assert_status_ok();
        assert!(generated.maybe_header(REQUEST_ID_HEADER).is_some());

        let echoed = server
            .get("/")
            .add_header(REQUEST_ID_HEADER, "req-123")
            .await;
        assert_eq!(echoed.header(REQUEST_ID_HEADER), "req-123");
        Ok(())
    }
}
