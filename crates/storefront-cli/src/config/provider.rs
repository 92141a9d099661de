//! Backend provider configuration.
//!
//! Blob storage and the login report share always go through OpenDAL
//! ([`StorageConfig`](storefront_opendal::StorageConfig) picks the service).
//! The cart queue and the customer profile table run either in process
//! memory or on NATS JetStream.

use std::sync::Arc;

use anyhow::Context;
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use storefront_core::memory::{MemoryProfileStore, MemoryQueue};
use storefront_core::prelude::{BlobStore, LoginLog, MessageQueue, ProfileStore};
use storefront_nats::NatsClient;
use storefront_opendal::StorageBackend;

use super::Cli;
use crate::TRACING_TARGET_CONFIG;

/// Where a queue or table lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessagingBackend {
    /// Process memory; contents are lost on exit.
    #[default]
    Memory,
    /// NATS JetStream (work-queue streams and KV buckets).
    Nats,
}

/// Backend selection for the cart queue and customer profiles.
#[derive(Debug, Clone, Default, Args, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Backend of the cart queue and its dead-letter queue
    #[arg(long, env = "QUEUE_BACKEND", value_enum, default_value = "memory")]
    pub queue_backend: MessagingBackend,

    /// Backend of the customer profile table
    #[arg(long, env = "PROFILE_BACKEND", value_enum, default_value = "memory")]
    pub profile_backend: MessagingBackend,
}

impl ProviderConfig {
    /// Returns true if any capability needs a NATS connection.
    pub fn uses_nats(&self) -> bool {
        self.queue_backend == MessagingBackend::Nats
            || self.profile_backend == MessagingBackend::Nats
    }
}

/// Connected capabilities the server and worker are assembled from.
pub struct Providers {
    pub blob_store: Arc<dyn BlobStore>,
    pub login_log: Arc<dyn LoginLog>,
    pub profile_store: Arc<dyn ProfileStore>,
    pub cart_queue: Arc<dyn MessageQueue>,
    pub dead_letter_queue: Arc<dyn MessageQueue>,
}

/// Creates every capability backend from CLI configuration.
///
/// # Errors
///
/// Returns an error if the storage backend cannot be built or NATS is
/// selected and unreachable.
pub async fn create_providers(cli: &Cli) -> anyhow::Result<Providers> {
    let storage = StorageBackend::new(cli.storage.clone())
        .context("failed to create storage backend")?;
    let storage = Arc::new(storage);

    let nats = if cli.providers.uses_nats() {
        let client = NatsClient::connect(cli.nats.clone())
            .await
            .context("failed to connect to NATS")?;
        Some(client)
    } else {
        None
    };

    let cart_queue_name = cli.service.cart_queue.as_str();
    let dead_letter_name = cli.pipeline.retry.dead_letter_queue_for(cart_queue_name);

    let (cart_queue, dead_letter_queue): (Arc<dyn MessageQueue>, Arc<dyn MessageQueue>) =
        match cli.providers.queue_backend {
            MessagingBackend::Memory => (
                Arc::new(MemoryQueue::new(cart_queue_name)),
                Arc::new(MemoryQueue::new(dead_letter_name)),
            ),
            MessagingBackend::Nats => {
                let client = nats.as_ref().context("NATS client is not connected")?;
                let cart_queue = client
                    .cart_queue(cart_queue_name)
                    .await
                    .context("failed to open cart queue")?;
                let dead_letter_queue = client
                    .cart_queue(&dead_letter_name)
                    .await
                    .context("failed to open dead-letter queue")?;
                (Arc::new(cart_queue), Arc::new(dead_letter_queue))
            }
        };

    let profile_store: Arc<dyn ProfileStore> = match cli.providers.profile_backend {
        MessagingBackend::Memory => Arc::new(MemoryProfileStore::new()),
        MessagingBackend::Nats => {
            let client = nats.as_ref().context("NATS client is not connected")?;
            Arc::new(client.profile_bucket())
        }
    };

    tracing::info!(
        target: TRACING_TARGET_CONFIG,
        storage_backend = %cli.storage.storage_backend,
        queue_backend = ?cli.providers.queue_backend,
        profile_backend = ?cli.providers.profile_backend,
        cart_queue = %cart_queue.name(),
        dead_letter_queue = %dead_letter_queue.name(),
        "Backends created"
    );

    Ok(Providers {
        blob_store: storage.clone(),
        login_log: storage,
        profile_store,
        cart_queue,
        dead_letter_queue,
    })
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn memory_is_the_default() {
        let config = ProviderConfig::default();
        assert_eq!(config.queue_backend, MessagingBackend::Memory);
        assert!(!config.uses_nats());

        let config = ProviderConfig {
            profile_backend: MessagingBackend::Nats,
            ..ProviderConfig::default()
        };
        assert!(config.uses_nats());
    }

    #[tokio::test]
    async fn memory_providers_bind_configured_queues() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "storefront",
            "--storage-backend",
            "memory",
            "--cart-queue",
            "orders",
        ])?;

        let providers = create_providers(&cli).await?;
        assert_eq!(providers.cart_queue.name(), "orders");
        assert_eq!(providers.dead_letter_queue.name(), "orders-poison");
        Ok(())
    }
}
