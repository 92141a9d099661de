//! Health check handler.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;

use super::response::MonitorStatus;
use crate::extract::Json;
use crate::service::ServiceState;

/// Tracing target for monitor operations.
const TRACING_TARGET: &str = "storefront_server::handler::monitors";

/// Reports healthy when the cart container can be listed.
#[tracing::instrument(skip_all)]
async fn health_status(
    State(service_state): State<ServiceState>,
) -> (StatusCode, Json<MonitorStatus>) {
    let container = &service_state.config.cart_container;
    let is_healthy = match service_state.blob_store.list(container).await {
        Ok(_) => true,
        Err(err) => {
            tracing::warn!(
                target: TRACING_TARGET,
                container = %container,
                error = %err,
                "Blob store health check failed"
            );
            false
        }
    };

    let status = MonitorStatus {
        is_healthy,
        ..MonitorStatus::default()
    };

    let code = if is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(status))
}

/// Returns a [`Router`] with all related routes.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/health", get(health_status))
}

#[cfg(test)]
mod tests {
    use crate::handler::test::create_test_server;

    #[tokio::test]
    async fn health_is_ok_in_memory() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server.get("/health").await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["isHealthy"], true);
        assert!(body["version"].is_string());
        Ok(())
    }
}
