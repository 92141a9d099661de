//! Cart ingestion pipeline.
//!
//! ## Architecture
//!
//! - [`intake`] - rejects empty and malformed messages
//! - [`persistence`] - decodes the product and writes the cart artifact
//! - [`CartIngestor`] - runs both stages for one message
//! - [`Worker`] - consumes the cart queue and applies the retry policy
//! - [`WorkerHandles`] - owns the spawned worker and its shutdown

/// Tracing target for pipeline events.
const TRACING_TARGET: &str = "storefront_server::pipeline";

mod error;
mod ingest;
pub mod intake;
pub mod persistence;
mod state;
mod worker;

pub use error::{IngestError, IngestErrorKind};
pub use ingest::CartIngestor;
pub use state::{
    DEFAULT_MAX_CONCURRENT_INGESTIONS, DEFAULT_POLL_INTERVAL_MS, PipelineConfig, PipelineState,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
pub use worker::{Disposition, Worker, process_message};

use crate::{Error, Result};

/// Handle to the background ingestion worker.
pub struct WorkerHandles {
    worker: JoinHandle<Result<()>>,
    cancel_token: CancellationToken,
}

impl WorkerHandles {
    /// Spawns the cart ingestion worker.
    ///
    /// The worker gets a consumer name in the format `{uuid}-cart`.
    pub fn spawn(state: &PipelineState) -> Self {
        let cancel_token = CancellationToken::new();
        let instance_id = Uuid::now_v7();

        tracing::info!(
            target: TRACING_TARGET,
            instance_id = %instance_id,
            max_concurrent_ingestions = state.config.max_concurrent_ingestions,
            max_attempts = state.config.retry.max_attempts,
            "Starting cart ingestion pipeline"
        );

        let worker = Worker::new(
            state.clone(),
            format!("{}-cart", instance_id),
            cancel_token.clone(),
            state.config.create_semaphore(),
        )
        .spawn();

        Self {
            worker,
            cancel_token,
        }
    }

    /// Requests graceful shutdown.
    ///
    /// The worker stops leasing messages and finishes those in flight.
    pub fn shutdown(&self) {
        tracing::info!(
            target: TRACING_TARGET,
            "Initiating graceful shutdown of cart ingestion pipeline"
        );
        self.cancel_token.cancel();
    }

    /// Aborts the worker immediately.
    ///
    /// Leased messages are redelivered by the queue once their lease expires.
    pub fn abort(&self) {
        tracing::warn!(
            target: TRACING_TARGET,
            "Aborting cart ingestion pipeline immediately"
        );
        self.cancel_token.cancel();
        self.worker.abort();
    }

    /// Checks if the worker has finished (possibly due to error).
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Waits for the worker to complete.
    pub async fn wait(self) -> Result<()> {
        self.worker
            .await
            .map_err(|e| Error::internal("pipeline", e.to_string()))??;

        tracing::info!(target: TRACING_TARGET, "Cart ingestion pipeline stopped");
        Ok(())
    }
}
