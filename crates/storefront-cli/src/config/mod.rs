//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── server: ServerConfig        # Host, port, shutdown timeout
//! ├── recovery: RecoveryConfig    # Request timeout
//! ├── service: ServiceConfig      # Container, queue, table and share names
//! ├── pipeline: PipelineConfig    # Worker concurrency, polling, retry policy
//! ├── providers: ProviderConfig   # Memory or NATS for queues and profiles
//! ├── storage: StorageConfig      # OpenDAL service for blobs and login reports
//! └── nats: NatsConfig            # NATS connection
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//!
//! # Example
//!
//! ```bash
//! storefront --storage-backend fs --storage-root ./data --port 8080
//!
//! STORAGE_ROOT=./data PORT=8080 storefront
//! ```

mod provider;
mod server;

use std::process;

use anyhow::{Context, anyhow};
use clap::Parser;
pub use provider::{MessagingBackend, ProviderConfig, Providers, create_providers};
use serde::{Deserialize, Serialize};
pub use server::ServerConfig;
use storefront_nats::NatsConfig;
use storefront_opendal::StorageConfig;
use storefront_server::middleware::RecoveryConfig;
use storefront_server::pipeline::PipelineConfig;
use storefront_server::service::ServiceConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "storefront")]
#[command(about = "Storefront HTTP API and cart ingestion worker")]
#[command(version)]
pub struct Cli {
    /// Server network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// Request timeout and panic recovery.
    #[clap(flatten)]
    pub recovery: RecoveryConfig,

    /// Resource names shared by the HTTP API and the worker.
    #[clap(flatten)]
    pub service: ServiceConfig,

    /// Cart ingestion worker and retry policy.
    #[clap(flatten)]
    pub pipeline: PipelineConfig,

    /// Queue and profile backend selection.
    #[clap(flatten)]
    pub providers: ProviderConfig,

    /// Blob and file share storage.
    #[clap(flatten)]
    pub storage: StorageConfig,

    /// NATS connection, used when a NATS backend is selected.
    #[clap(flatten)]
    pub nats: NatsConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded before clap parses arguments so its values
    /// act as environment defaults.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    ///
    /// The log level is read from `RUST_LOG` and defaults to `info`.
    pub fn init_tracing() -> anyhow::Result<()> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("info"))
            .context("failed to create env filter")?;

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
            .map_err(|e| anyhow!("failed to initialize tracing: {e}"))
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;
        self.service
            .validate()
            .context("invalid service configuration")?;
        self.pipeline
            .validate()
            .context("invalid pipeline configuration")?;
        self.storage
            .validate()
            .map_err(|e| anyhow!(e))
            .context("invalid storage configuration")?;

        if self.providers.uses_nats() {
            self.nats
                .validate()
                .map_err(|e| anyhow!(e))
                .context("invalid NATS configuration")?;
        }

        Ok(())
    }

    /// Logs configuration (no credentials).
    pub fn log(&self) {
        Self::log_build_info();
        self.server.log();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            request_timeout_secs = self.recovery.request_timeout,
            cart_container = %self.service.cart_container,
            cart_queue = %self.service.cart_queue,
            profile_table = %self.service.profile_table,
            login_share = %self.service.login_share,
            cache_max_age_secs = self.service.cache_max_age_secs,
            "Service configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            max_concurrent_ingestions = self.pipeline.max_concurrent_ingestions,
            poll_interval_ms = self.pipeline.poll_interval_ms,
            max_attempts = self.pipeline.retry.max_attempts,
            initial_backoff_ms = self.pipeline.retry.initial_backoff_ms,
            max_backoff_ms = self.pipeline.retry.max_backoff_ms,
            dead_letter_queue = %self.pipeline.retry.dead_letter_queue_for(&self.service.cart_queue),
            "Pipeline configuration"
        );
    }

    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [
            cfg!(feature = "dotenv").then_some("dotenv"),
            cfg!(feature = "azblob").then_some("azblob"),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn argument_ids_do_not_collide() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_are_valid() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["storefront"])?;
        cli.validate()?;
        assert_eq!(cli.service.cart_container, "cart");
        assert_eq!(cli.service.cache_max_age_secs, 30);
        Ok(())
    }

    #[test]
    fn invalid_retry_policy_is_rejected() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["storefront", "--retry-max-attempts", "0"])?;
        assert!(cli.validate().is_err());
        Ok(())
    }

    #[test]
    fn nats_backend_selection_parses() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "storefront",
            "--queue-backend",
            "nats",
            "--nats-url",
            "nats://queue.internal:4222",
        ])?;
        assert_eq!(cli.providers.queue_backend, MessagingBackend::Nats);
        assert_eq!(cli.providers.profile_backend, MessagingBackend::Memory);
        assert!(cli.providers.uses_nats());
        Ok(())
    }
}
