//! Pipeline state and configuration.

use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use storefront_core::queue::{MessageQueue, RetryPolicy};
use tokio::sync::Semaphore;

use super::CartIngestor;
use crate::service::ServiceState;
use crate::{Error, Result};

/// Default maximum concurrent ingestions.
pub const DEFAULT_MAX_CONCURRENT_INGESTIONS: usize = 4;

/// Default delay between polls of an empty queue, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Upper bound for [`PipelineConfig::max_concurrent_ingestions`].
const MAX_CONCURRENT_INGESTIONS: usize = 1024;

/// Configuration for the cart ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct PipelineConfig {
    /// Maximum messages ingested at the same time
    #[cfg_attr(
        feature = "config",
        arg(long, env = "PIPELINE_MAX_CONCURRENT_INGESTIONS", default_value_t = DEFAULT_MAX_CONCURRENT_INGESTIONS)
    )]
    pub max_concurrent_ingestions: usize,

    /// Delay between polls of an empty queue, in milliseconds
    #[cfg_attr(
        feature = "config",
        arg(long, env = "PIPELINE_POLL_INTERVAL_MS", default_value_t = DEFAULT_POLL_INTERVAL_MS)
    )]
    pub poll_interval_ms: u64,

    /// Redelivery and dead-letter policy for failed ingestions
    #[cfg_attr(feature = "config", command(flatten))]
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_ingestions: DEFAULT_MAX_CONCURRENT_INGESTIONS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            retry: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates a new pipeline configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum concurrent ingestions.
    #[must_use]
    pub fn with_max_concurrent_ingestions(mut self, max_concurrent_ingestions: usize) -> Self {
        self.max_concurrent_ingestions = max_concurrent_ingestions;
        self
    }

    /// Sets the empty-queue poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval_ms = poll_interval.as_millis() as u64;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the empty-queue poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Creates a semaphore for limiting concurrent ingestions.
    pub fn create_semaphore(&self) -> Arc<Semaphore> {
        Arc::new(Semaphore::new(self.max_concurrent_ingestions))
    }

    /// Validates concurrency bounds and the retry policy.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_CONCURRENT_INGESTIONS).contains(&self.max_concurrent_ingestions) {
            return Err(Error::config(format!(
                "pipeline concurrency must be between 1 and {MAX_CONCURRENT_INGESTIONS}, got {}",
                self.max_concurrent_ingestions
            )));
        }
        self.retry.validate().map_err(Error::config)
    }
}

/// Everything a pipeline worker needs.
#[derive(Clone)]
pub struct PipelineState {
    /// Ingestion unit of work.
    pub ingestor: CartIngestor,
    /// Queue cart messages are consumed from.
    pub cart_queue: Arc<dyn MessageQueue>,
    /// Queue exhausted messages are moved to.
    pub dead_letter_queue: Arc<dyn MessageQueue>,
    /// Pipeline configuration.
    pub config: PipelineConfig,
}

impl PipelineState {
    /// Creates pipeline state from service state and configuration.
    ///
    /// `dead_letter_queue` must be bound to the queue the retry policy names
    /// for the cart queue.
    pub fn new(
        state: &ServiceState,
        dead_letter_queue: Arc<dyn MessageQueue>,
        config: PipelineConfig,
    ) -> Result<Self> {
        config.validate()?;

        let expected = config.retry.dead_letter_queue_for(state.cart_queue.name());
        if dead_letter_queue.name() != expected {
            return Err(Error::config(format!(
                "dead-letter queue handle is bound to '{}', expected '{expected}'",
                dead_letter_queue.name()
            )));
        }

        Ok(Self {
            ingestor: CartIngestor::from_state(state),
            cart_queue: state.cart_queue.clone(),
            dead_letter_queue,
            config,
        })
    }
}
