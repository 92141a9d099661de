//! HTTP routes of the storefront API.
//!
//! | Method | Path        | Handler                       |
//! |--------|-------------|-------------------------------|
//! | GET    | `/cart`     | list stored cart products     |
//! | POST   | `/cart`     | enqueue a product for ingestion |
//! | POST   | `/register` | create a customer profile     |
//! | POST   | `/login`    | verify credentials            |
//! | GET    | `/health`   | liveness check                |

mod accounts;
mod authentication;
mod carts;
mod error;
mod monitors;
pub mod request;
pub mod response;

use axum::Router;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
use crate::service::ServiceState;

#[inline]
async fn handler() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Builds the API router with unknown paths answered by a JSON 404.
pub fn routes(state: ServiceState) -> Router {
    Router::new()
        .merge(carts::routes())
        .merge(accounts::routes())
        .merge(authentication::routes())
        .merge(monitors::routes())
        .fallback(handler)
        .with_state(state)
}

#[cfg(test)]
mod test {
    use axum_test::TestServer;

    use crate::handler::routes;
    use crate::service::{ServiceConfig, ServiceState};

    pub fn create_test_server_with_state(state: ServiceState) -> anyhow::Result<TestServer> {
        let server = TestServer::new(routes(state))?;
        Ok(server)
    }

    pub fn create_test_server() -> anyhow::Result<TestServer> {
        let state = ServiceState::in_memory(ServiceConfig::default())?;
        create_test_server_with_state(state)
    }

    #[tokio::test]
    async fn handlers() -> anyhow::Result<()> {
        let server = create_test_server()?;
        assert!(server.is_running());
        Ok(())
    }

    #[tokio::test]
    async fn unknown_path_is_json_not_found() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server.get("/orders").await;
        response.assert_status_not_found();

        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "not_found");
        Ok(())
    }
}
