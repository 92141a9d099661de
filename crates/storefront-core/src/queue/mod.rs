//! Message queue capability and the retry contract of its consumers.

mod message;
mod retry_policy;

use async_trait::async_trait;
pub use message::{Acknowledge, QueueMessage};
pub use retry_policy::{DEFAULT_DEAD_LETTER_SUFFIX, RetryDecision, RetryPolicy};

use crate::Result;

/// At-least-once message queue bound to a single named queue.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Name of the queue this handle publishes to and consumes from.
    fn name(&self) -> &str;

    /// Publishes a text payload.
    async fn send(&self, payload: &str) -> Result<()>;

    /// Waits briefly for the next message.
    ///
    /// Returns `None` when nothing is available. The returned message stays
    /// leased to the caller until it is settled through one of
    /// [`QueueMessage::ack`], [`QueueMessage::retry`] or [`QueueMessage::reject`].
    async fn receive(&self) -> Result<Option<QueueMessage>>;
}
