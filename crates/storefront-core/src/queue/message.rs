//! Leased queue messages.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// Transport-specific settlement of a leased message.
#[async_trait]
pub trait Acknowledge: Send + Sync {
    /// Marks the message as processed and removes it from the queue.
    async fn ack(&self) -> Result<()>;

    /// Returns the message to the queue for redelivery after `delay`.
    async fn retry(&self, delay: Duration) -> Result<()>;

    /// Removes the message without redelivery.
    async fn reject(&self) -> Result<()>;
}

/// A message received from a [`MessageQueue`](super::MessageQueue).
pub struct QueueMessage {
    id: String,
    body: Option<String>,
    attempt: u32,
    acker: Box<dyn Acknowledge>,
}

impl QueueMessage {
    /// Creates a message leased from a transport.
    ///
    /// `attempt` is the 1-based delivery count; `body` is `None` when the
    /// transport delivered no readable text.
    pub fn new(
        id: impl Into<String>,
        body: Option<String>,
        attempt: u32,
        acker: impl Acknowledge + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            body,
            attempt: attempt.max(1),
            acker: Box::new(acker),
        }
    }

    /// Transport identifier of the message.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Text payload, if any.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// How many times this message has been delivered, starting at 1.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Acknowledges successful processing.
    pub async fn ack(self) -> Result<()> {
        self.acker.ack().await
    }

    /// Requests redelivery after `delay`.
    pub async fn retry(self, delay: Duration) -> Result<()> {
        self.acker.retry(delay).await
    }

    /// Drops the message without redelivery.
    pub async fn reject(self) -> Result<()> {
        self.acker.reject().await
    }
}

impl fmt::Debug for QueueMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueMessage")
            .field("id", &self.id)
            .field("attempt", &self.attempt)
            .field("body_len", &self.body.as_ref().map(String::len))
            .finish()
    }
}
