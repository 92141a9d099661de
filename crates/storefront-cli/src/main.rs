#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;

use std::process;

use anyhow::Context;
use axum::Router;
use storefront_server::handler::routes;
use storefront_server::middleware::{RecoveryConfig, RouterObservabilityExt, RouterRecoveryExt};
use storefront_server::pipeline::{PipelineState, WorkerHandles};
use storefront_server::service::ServiceState;

use crate::config::{Cli, Providers, create_providers};
use crate::server::{serve_http, shutdown_signal};

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "storefront_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "storefront_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "storefront_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing()?;
    cli.log();
    cli.validate()?;

    let providers = create_providers(&cli).await?;
    let (state, pipeline) = create_state(&cli, providers)?;

    let workers = WorkerHandles::spawn(&pipeline);
    let router = create_router(state, &cli.recovery);

    let served = serve_http(router, &cli.server, shutdown_signal()).await;

    workers.shutdown();
    match tokio::time::timeout(cli.server.shutdown_timeout(), workers.wait()).await {
        Ok(result) => result.context("cart ingestion worker failed")?,
        Err(_) => tracing::warn!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            timeout_secs = cli.server.shutdown_timeout,
            "Cart ingestion worker did not drain in time, leased messages will be redelivered"
        ),
    }

    served.map_err(|err| {
        if let Some(suggestion) = err.suggestion() {
            tracing::info!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                code = err.error_code(),
                suggestion,
                "Server failed"
            );
        }
        anyhow::Error::new(err)
    })?;

    Ok(())
}

/// Assembles the HTTP service state and the ingestion pipeline state.
fn create_state(cli: &Cli, providers: Providers) -> anyhow::Result<(ServiceState, PipelineState)> {
    let state = ServiceState::new(
        cli.service.clone(),
        providers.blob_store,
        providers.profile_store,
        providers.login_log,
        providers.cart_queue,
    )
    .context("failed to create service state")?;

    let pipeline = PipelineState::new(&state, providers.dead_letter_queue, cli.pipeline.clone())
        .context("failed to create pipeline state")?;

    Ok((state, pipeline))
}

/// Creates the router with all middleware layers applied.
///
/// Middleware is applied in reverse order (last added = outermost):
/// 1. Recovery (outermost) - catches panics and enforces timeouts
/// 2. Observability - request IDs and tracing spans
/// 3. Metrics - per-request latency and status logging
/// 4. Routes (innermost) - actual request handlers
fn create_router(state: ServiceState, recovery: &RecoveryConfig) -> Router {
    routes(state)
        .with_metrics()
        .with_observability()
        .with_recovery(recovery)
}
