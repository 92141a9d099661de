use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::queue::{Acknowledge, MessageQueue, QueueMessage};
use crate::{Result, TRACING_TARGET_MEMORY};

/// Settled messages remembered for inspection; older entries are forgotten.
pub const SETTLED_HISTORY_LIMIT: usize = 256;

#[derive(Debug, Clone)]
struct Pending {
    id: String,
    body: Option<String>,
    attempt: u32,
    not_before: Instant,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<Pending>,
    in_flight: usize,
    next_id: u64,
    acked: VecDeque<String>,
    acked_total: u64,
    rejected: VecDeque<Option<String>>,
    rejected_total: u64,
}

impl QueueState {
    fn enqueue(&mut self, body: Option<String>) {
        self.next_id += 1;
        self.pending.push_back(Pending {
            id: self.next_id.to_string(),
            body,
            attempt: 1,
            not_before: Instant::now(),
        });
    }

    fn redeliver(&mut self, pending: &Pending, delay: Duration) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.pending.push_back(Pending {
            attempt: pending.attempt + 1,
            not_before: Instant::now() + delay,
            ..pending.clone()
        });
    }

    fn record_ack(&mut self, id: String) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.acked_total += 1;
        push_bounded(&mut self.acked, id);
    }

    fn record_reject(&mut self, body: Option<String>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.rejected_total += 1;
        push_bounded(&mut self.rejected, body);
    }
}

fn push_bounded<T>(history: &mut VecDeque<T>, item: T) {
    if history.len() == SETTLED_HISTORY_LIMIT {
        history.pop_front();
    }
    history.push_back(item);
}

/// Work queue kept in process memory.
///
/// Retried messages become visible again once their delay elapses, so tests
/// driving a worker can pause tokio time and advance it explicitly. A
/// message dropped without being settled is redelivered at once, the way an
/// expired lease would be. Only the last [`SETTLED_HISTORY_LIMIT`] settled
/// messages are kept for inspection.
#[derive(Debug, Clone)]
pub struct MemoryQueue {
    name: String,
    state: Arc<Mutex<QueueState>>,
}

impl MemoryQueue {
    /// Creates an empty queue with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::default(),
        }
    }

    /// Enqueues a message that may have no body at all.
    pub async fn push_raw(&self, body: Option<String>) {
        self.state.lock().await.enqueue(body);
    }

    /// Messages waiting for delivery, including delayed ones.
    pub async fn pending(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// Messages received but not settled yet.
    pub async fn in_flight(&self) -> usize {
        self.state.lock().await.in_flight
    }

    /// Identifiers of the most recently acknowledged messages, in settlement order.
    pub async fn acked(&self) -> Vec<String> {
        self.state.lock().await.acked.iter().cloned().collect()
    }

    /// Number of messages acknowledged since the queue was created.
    pub async fn acked_count(&self) -> u64 {
        self.state.lock().await.acked_total
    }

    /// Bodies of the most recently rejected messages, in settlement order.
    pub async fn rejected(&self) -> Vec<Option<String>> {
        self.state.lock().await.rejected.iter().cloned().collect()
    }

    /// Number of messages rejected since the queue was created.
    pub async fn rejected_count(&self) -> u64 {
        self.state.lock().await.rejected_total
    }

    /// Bodies of every pending message, in queue order.
    pub async fn pending_bodies(&self) -> Vec<Option<String>> {
        self.state
            .lock()
            .await
            .pending
            .iter()
            .map(|pending| pending.body.clone())
            .collect()
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, payload: &str) -> Result<()> {
        self.state.lock().await.enqueue(Some(payload.to_owned()));
        tracing::trace!(target: TRACING_TARGET_MEMORY, queue = %self.name, "Enqueued message");
        Ok(())
    }

    async fn receive(&self) -> Result<Option<QueueMessage>> {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let Some(index) = state.pending.iter().position(|p| p.not_before <= now) else {
            return Ok(None);
        };
        let Some(pending) = state.pending.remove(index) else {
            return Ok(None);
        };
        state.in_flight += 1;

        let acker = MemoryAcker {
            state: Arc::clone(&self.state),
            pending: pending.clone(),
            settled: AtomicBool::new(false),
        };
        Ok(Some(QueueMessage::new(
            pending.id,
            pending.body,
            pending.attempt,
            acker,
        )))
    }
}

struct MemoryAcker {
    state: Arc<Mutex<QueueState>>,
    pending: Pending,
    settled: AtomicBool,
}

#[async_trait]
impl Acknowledge for MemoryAcker {
    async fn ack(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.settled.store(true, Ordering::Release);
        state.record_ack(self.pending.id.clone());
        Ok(())
    }

    async fn retry(&self, delay: Duration) -> Result<()> {
        let mut state = self.state.lock().await;
        self.settled.store(true, Ordering::Release);
        state.redeliver(&self.pending, delay);
        Ok(())
    }

    async fn reject(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.settled.store(true, Ordering::Release);
        state.record_reject(self.pending.body.clone());
        Ok(())
    }
}

impl Drop for MemoryAcker {
    fn drop(&mut self) {
        if self.settled.load(Ordering::Acquire) {
            return;
        }

        tracing::warn!(
            target: TRACING_TARGET_MEMORY,
            message_id = %self.pending.id,
            attempt = self.pending.attempt,
            "Message dropped without settlement, redelivering"
        );

        if let Ok(mut state) = self.state.try_lock() {
            state.redeliver(&self.pending, Duration::ZERO);
            return;
        }

        let state = Arc::clone(&self.state);
        let pending = self.pending.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    state.lock().await.redeliver(&pending, Duration::ZERO);
                });
            }
            Err(_) => tracing::error!(
                target: TRACING_TARGET_MEMORY,
                message_id = %pending.id,
                "No runtime to redeliver dropped message, it is lost"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_receive_ack() -> anyhow::Result<()> {
        let queue = MemoryQueue::new("cartqueue");
        queue.send("{}").await?;

        let message = queue.receive().await?.expect("message should be queued");
        assert_eq!(message.body(), Some("{}"));
        assert_eq!(message.attempt(), 1);
        assert_eq!(queue.in_flight().await, 1);

        let id = message.id().to_owned();
        message.ack().await?;
        assert_eq!(queue.acked().await, vec![id]);
        assert_eq!(queue.in_flight().await, 0);
        assert!(queue.receive().await?.is_none());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn retry_is_delayed_and_counts_attempts() -> anyhow::Result<()> {
        let queue = MemoryQueue::new("cartqueue");
        queue.send("x").await?;

        let message = queue.receive().await?.expect("message should be queued");
        message.retry(Duration::from_secs(5)).await?;
        assert!(queue.receive().await?.is_none());

        tokio::time::advance(Duration::from_secs(5)).await;
        let message = queue.receive().await?.expect("message should be visible");
        assert_eq!(message.attempt(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn dropped_message_is_redelivered() -> anyhow::Result<()> {
        let queue = MemoryQueue::new("cartqueue");
        queue.send("{}").await?;

        let message = queue.receive().await?.expect("message should be queued");
        drop(message);
        assert_eq!(queue.in_flight().await, 0);
        assert_eq!(queue.pending().await, 1);

        let message = queue.receive().await?.expect("message should be redelivered");
        assert_eq!(message.attempt(), 2);
        message.ack().await?;
        assert_eq!(queue.pending().await, 0);
        assert_eq!(queue.acked_count().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn settled_history_is_bounded() -> anyhow::Result<()> {
        let queue = MemoryQueue::new("cartqueue");
        let total = SETTLED_HISTORY_LIMIT + 10;

        for _ in 0..total {
            queue.send("{}").await?;
            let message = queue.receive().await?.expect("message should be queued");
            message.ack().await?;
        }

        let acked = queue.acked().await;
        assert_eq!(acked.len(), SETTLED_HISTORY_LIMIT);
        assert_eq!(acked.last().map(String::as_str), Some(total.to_string().as_str()));
        assert_eq!(queue.acked_count().await, total as u64);
        assert_eq!(queue.in_flight().await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn reject_records_body() -> anyhow::Result<()> {
        let queue = MemoryQueue::new("cartqueue");
        queue.push_raw(None).await;

        let message = queue.receive().await?.expect("message should be queued");
        assert!(message.body().is_none());
        message.reject().await?;

        assert_eq!(queue.rejected().await, vec![None]);
        assert_eq!(queue.rejected_count().await, 1);
        assert_eq!(queue.pending().await, 0);
        Ok(())
    }
}
