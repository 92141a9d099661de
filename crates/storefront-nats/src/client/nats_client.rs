//! NATS client wrapper and connection management.
//!
//! The underlying `async-nats` client multiplexes every operation over a
//! single TCP connection and reconnects on its own, so one [`NatsClient`] is
//! shared by the HTTP handlers and the ingestion worker.

use std::sync::Arc;
use std::time::Duration;

use async_nats::{Client, ConnectOptions, jetstream};
use tokio::time::timeout;

use super::nats_config::NatsConfig;
use crate::kv::ProfileBucket;
use crate::queue::CartQueue;
use crate::{Error, Result, TRACING_TARGET_CLIENT, TRACING_TARGET_CONNECTION};

/// NATS client wrapper with connection management.
///
/// This wrapper is cheaply cloneable and thread-safe.
#[derive(Debug, Clone)]
pub struct NatsClient {
    inner: Arc<NatsClientInner>,
}

#[derive(Debug)]
struct NatsClientInner {
    client: Client,
    jetstream: jetstream::Context,
    config: NatsConfig,
}

impl NatsClient {
    /// Create a new NATS client and connect
    #[tracing::instrument(skip(config), target = TRACING_TARGET_CONNECTION)]
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        config.validate().map_err(Error::invalid_config)?;
        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            servers = %config.nats_url,
            "Connecting to NATS"
        );

        let mut connect_opts = ConnectOptions::new()
            .name(config.name())
            .ping_interval(config.ping_interval());

        if let Some(token) = &config.nats_token {
            connect_opts = connect_opts.token(token.clone());
        }

        if let Some(timeout) = config.connect_timeout() {
            connect_opts = connect_opts.connection_timeout(timeout);
        }

        if let Some(max_reconnects) = config.max_reconnects_option() {
            connect_opts = connect_opts.max_reconnects(max_reconnects);
        }
        let reconnect_delay_ms = config.reconnect_delay().as_millis().min(u64::MAX as u128) as u64;
        connect_opts = connect_opts.reconnect_delay_callback(move |attempts| {
            Duration::from_millis(std::cmp::min(
                reconnect_delay_ms * 2_u64.pow(attempts.min(16) as u32),
                30_000,
            ))
        });

        let connect_timeout = config.connect_timeout().unwrap_or(Duration::from_secs(30));
        let client = timeout(
            connect_timeout,
            async_nats::connect_with_options(config.nats_url.as_str(), connect_opts),
        )
        .await
        .map_err(|_| Error::timeout(connect_timeout))?
        .map_err(|e| Error::Connection(Box::new(e)))?;

        let jetstream = jetstream::new(client.clone());

        let server_info = client.server_info();
        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            server_host = %server_info.host,
            server_version = %server_info.version,
            max_payload = server_info.max_payload,
            "Connected to NATS"
        );

        Ok(Self {
            inner: Arc::new(NatsClientInner {
                client,
                jetstream,
                config,
            }),
        })
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &NatsConfig {
        &self.inner.config
    }

    /// Get the JetStream context
    #[must_use]
    pub fn jetstream(&self) -> &jetstream::Context {
        &self.inner.jetstream
    }

    /// Test connectivity with a flush round-trip
    #[tracing::instrument(skip(self), target = TRACING_TARGET_CONNECTION)]
    pub async fn ping(&self) -> Result<Duration> {
        let start = std::time::Instant::now();
        let limit = Duration::from_secs(10);

        timeout(limit, self.inner.client.flush())
            .await
            .map_err(|_| Error::timeout(limit))?
            .map_err(|e| Error::Connection(Box::new(e)))?;

        let ping_time = start.elapsed();
        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            duration_ms = ping_time.as_millis(),
            "NATS ping successful"
        );
        Ok(ping_time)
    }

    /// Check if the client is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(
            self.inner.client.connection_state(),
            async_nats::connection::State::Connected
        )
    }

    /// Get or create the work queue with the given name.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_CLIENT)]
    pub async fn cart_queue(&self, name: &str) -> Result<CartQueue> {
        CartQueue::new(&self.inner.jetstream, name, &self.inner.config).await
    }

    /// Get a profile store whose tables are KV buckets.
    #[must_use]
    pub fn profile_bucket(&self) -> ProfileBucket {
        ProfileBucket::new(&self.inner.jetstream)
    }
}
