//! HTTP server startup.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

use super::{Result, ServerError};
use crate::TRACING_TARGET_SERVER_STARTUP as STARTUP;
use crate::TRACING_TARGET_SERVER_SHUTDOWN as SHUTDOWN;
use crate::config::ServerConfig;

/// Binds to the configured address and serves `app` until `shutdown` resolves.
///
/// Once `shutdown` resolves the listener stops accepting connections and
/// in-flight requests are allowed to finish.
pub async fn serve_http<F>(app: Router, config: &ServerConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    config
        .validate()
        .map_err(|e| ServerError::InvalidConfig(e.to_string()))?;

    let server_addr = config.server_addr();
    let listener = TcpListener::bind(server_addr).await.map_err(|source| {
        tracing::error!(
            target: STARTUP,
            addr = %server_addr,
            error = %source,
            "Failed to bind to address"
        );
        ServerError::BindError {
            address: server_addr.to_string(),
            source,
        }
    })?;

    tracing::info!(
        target: STARTUP,
        addr = %server_addr,
        "Server is ready and listening for connections"
    );

    if config.binds_to_all_interfaces() {
        tracing::warn!(
            target: STARTUP,
            "Server is bound to all interfaces. Ensure firewall rules are properly configured."
        );
    }

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .map_err(|err| {
        tracing::error!(
            target: SHUTDOWN,
            error = %err,
            "Server encountered an error"
        );
        ServerError::Runtime(err)
    })?;

    tracing::info!(target: SHUTDOWN, "HTTP server shut down gracefully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use axum::routing::get;

    use super::*;

    #[tokio::test]
    async fn serve_returns_after_shutdown() -> anyhow::Result<()> {
        // Reserve a free port, then release it for the server.
        let reserved = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let port = reserved.local_addr()?.port();
        drop(reserved);

        let config = ServerConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port,
            shutdown_timeout: 1,
        };
        let app = Router::new().route("/health", get(|| async { "ok" }));

        serve_http(app, &config, async {}).await?;
        Ok(())
    }

    #[tokio::test]
    async fn privileged_port_is_rejected() {
        let config = ServerConfig {
            port: 80,
            ..ServerConfig::default()
        };

        let result = serve_http(Router::new(), &config, async {}).await;
        assert!(matches!(result, Err(ServerError::InvalidConfig(_))));
    }
}
