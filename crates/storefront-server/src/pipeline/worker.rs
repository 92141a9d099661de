//! Queue consumer driving the cart ingestor.

use std::sync::Arc;
use std::time::Duration;

use storefront_core::queue::{QueueMessage, RetryDecision};
use storefront_core::store::StoredArtifact;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{IngestErrorKind, PipelineState, TRACING_TARGET};
use crate::{Error, Result};

/// What happened to a message after one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Ingested and acknowledged.
    Stored(StoredArtifact),
    /// Failed permanently and acknowledged without redelivery.
    Discarded(IngestErrorKind),
    /// Failed and handed back to the queue for redelivery after the delay.
    Retried(Duration),
    /// Failed on its last allowed delivery and moved to the dead-letter queue.
    DeadLettered,
}

/// Cart ingestion worker.
///
/// Polls the cart queue, runs each message through the ingestor on its own
/// task, and settles the message according to the outcome and the retry
/// policy. At most `max_concurrent_ingestions` messages are leased at once.
pub struct Worker {
    state: PipelineState,
    consumer_name: String,
    cancel_token: CancellationToken,
    semaphore: Arc<Semaphore>,
}

impl Worker {
    /// Creates a new worker.
    pub fn new(
        state: PipelineState,
        consumer_name: impl Into<String>,
        cancel_token: CancellationToken,
        semaphore: Arc<Semaphore>,
    ) -> Self {
        Self {
            state,
            consumer_name: consumer_name.into(),
            cancel_token,
            semaphore,
        }
    }

    /// Spawns the worker as a background task.
    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }

    /// Runs the worker loop until cancelled, then waits for in-flight messages.
    async fn run(self) -> Result<()> {
        tracing::info!(
            target: TRACING_TARGET,
            consumer = %self.consumer_name,
            queue = %self.state.cart_queue.name(),
            dead_letter_queue = %self.state.dead_letter_queue.name(),
            "Starting cart ingestion worker"
        );

        loop {
            // Lease a message only when a slot is free to process it.
            let permit = tokio::select! {
                biased;
                () = self.cancel_token.cancelled() => break,
                permit = self.semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => {
                        tracing::error!(target: TRACING_TARGET, "Semaphore closed, stopping worker");
                        break;
                    }
                },
            };

            let received = tokio::select! {
                biased;
                () = self.cancel_token.cancelled() => break,
                received = self.state.cart_queue.receive() => received,
            };

            let msg = match received {
                Ok(Some(msg)) => msg,
                Ok(None) => {
                    drop(permit);
                    tracing::trace!(target: TRACING_TARGET, "No messages available");
                    self.idle().await;
                    continue;
                }
                Err(err) => {
                    drop(permit);
                    tracing::error!(
                        target: TRACING_TARGET,
                        error = %err,
                        "Failed to receive message"
                    );
                    self.idle().await;
                    continue;
                }
            };

            let state = self.state.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let message_id = msg.id().to_owned();

                if let Err(err) = process_message(&state, msg).await {
                    tracing::error!(
                        target: TRACING_TARGET,
                        message_id = %message_id,
                        error = %err,
                        "Failed to settle message"
                    );
                }
            });
        }

        tracing::info!(
            target: TRACING_TARGET,
            consumer = %self.consumer_name,
            "Shutdown requested, waiting for in-flight messages"
        );
        self.drain().await
    }

    /// Sleeps for the poll interval unless cancelled first.
    async fn idle(&self) {
        tokio::select! {
            biased;
            () = self.cancel_token.cancelled() => {}
            () = tokio::time::sleep(self.state.config.poll_interval()) => {}
        }
    }

    /// Waits until every spawned ingestion has released its permit.
    async fn drain(&self) -> Result<()> {
        let permits = u32::try_from(self.state.config.max_concurrent_ingestions)
            .map_err(|e| Error::internal("pipeline", e.to_string()))?;

        let _all = self
            .semaphore
            .acquire_many(permits)
            .await
            .map_err(|e| Error::internal("pipeline", e.to_string()))?;

        tracing::info!(
            target: TRACING_TARGET,
            consumer = %self.consumer_name,
            "Cart ingestion worker stopped"
        );
        Ok(())
    }
}

/// Ingests one message and settles it.
///
/// - success: ack
/// - validation or format failure: log and ack, the message is dropped
/// - decode or store failure: ask the retry policy, then either return the
///   message to the queue with a delay or publish its body to the
///   dead-letter queue and reject it
///
/// Errors are transport failures while settling; the message is then
/// redelivered by the queue once its lease expires.
pub async fn process_message(state: &PipelineState, msg: QueueMessage) -> Result<Disposition> {
    let message_id = msg.id().to_owned();
    let attempt = msg.attempt();

    tracing::debug!(
        target: TRACING_TARGET,
        message_id = %message_id,
        attempt,
        "Processing cart message"
    );

    let err = match state.ingestor.ingest(msg.body()).await {
        Ok(artifact) => {
            msg.ack().await?;
            return Ok(Disposition::Stored(artifact));
        }
        Err(err) => err,
    };

    if !err.is_retryable() {
        tracing::warn!(
            target: TRACING_TARGET,
            message_id = %message_id,
            kind = %err.kind(),
            "Discarding cart message"
        );
        msg.ack().await?;
        return Ok(Disposition::Discarded(err.kind()));
    }

    let policy = &state.config.retry;
    match policy.decide(attempt) {
        RetryDecision::Retry(delay) => {
            tracing::warn!(
                target: TRACING_TARGET,
                message_id = %message_id,
                attempt,
                max_attempts = policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                kind = %err.kind(),
                "Retrying cart message"
            );
            msg.retry(delay).await?;
            Ok(Disposition::Retried(delay))
        }
        RetryDecision::DeadLetter => {
            let body = msg.body().unwrap_or_default().to_owned();

            if let Err(send_err) = state.dead_letter_queue.send(&body).await {
                let delay = policy.backoff(attempt);
                tracing::error!(
                    target: TRACING_TARGET,
                    message_id = %message_id,
                    dead_letter_queue = %state.dead_letter_queue.name(),
                    error = %send_err,
                    "Failed to dead-letter cart message, retrying instead"
                );
                msg.retry(delay).await?;
                return Ok(Disposition::Retried(delay));
            }

            tracing::error!(
                target: TRACING_TARGET,
                message_id = %message_id,
                attempt,
                dead_letter_queue = %state.dead_letter_queue.name(),
                kind = %err.kind(),
                "Cart message dead-lettered"
            );
            msg.reject().await?;
            Ok(Disposition::DeadLettered)
        }
    }
}
