//! Work-queue stream with a single durable pull consumer.

use std::fmt;
use std::time::Duration;

use async_nats::jetstream::consumer::{self, PullConsumer};
use async_nats::jetstream::{self, AckKind, stream};
use async_trait::async_trait;
use futures::StreamExt;
use storefront_core::queue::{Acknowledge, MessageQueue, QueueMessage};

use crate::{Error, NatsConfig, Result, TRACING_TARGET_QUEUE};

/// Returns the JetStream stream backing the queue `name`.
pub fn stream_name(name: &str) -> String {
    format!("QUEUE_{}", sanitize(name).to_uppercase())
}

/// Returns the subject messages for the queue `name` are published on.
pub fn subject(name: &str) -> String {
    format!("queue.{}", sanitize(name))
}

/// Returns the durable consumer shared by every worker of the queue `name`.
pub fn consumer_name(name: &str) -> String {
    format!("{}_worker", sanitize(name))
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// At-least-once queue on a JetStream work-queue stream.
///
/// The consumer never gives up on a message by itself; redelivery delay and
/// dead-lettering are driven by the caller through [`QueueMessage::retry`]
/// and [`QueueMessage::reject`].
pub struct CartQueue {
    jetstream: jetstream::Context,
    consumer: PullConsumer,
    name: String,
    subject: String,
    consumer_name: String,
    fetch_timeout: Duration,
}

impl CartQueue {
    /// Gets or creates the stream and consumer for the queue `name`.
    #[tracing::instrument(skip(jetstream, config), target = TRACING_TARGET_QUEUE)]
    pub(crate) async fn new(
        jetstream: &jetstream::Context,
        name: &str,
        config: &NatsConfig,
    ) -> Result<Self> {
        let stream_name = stream_name(name);
        let subject = subject(name);
        let consumer_name = consumer_name(name);

        let stream = match jetstream.get_stream(&stream_name).await {
            Ok(stream) => {
                tracing::debug!(
                    target: TRACING_TARGET_QUEUE,
                    stream = %stream_name,
                    "Using existing queue stream"
                );
                stream
            }
            Err(_) => {
                tracing::debug!(
                    target: TRACING_TARGET_QUEUE,
                    stream = %stream_name,
                    subject = %subject,
                    "Creating queue stream"
                );
                let stream_config = stream::Config {
                    name: stream_name.clone(),
                    description: Some(format!("Work queue: {name}")),
                    subjects: vec![subject.clone()],
                    retention: stream::RetentionPolicy::WorkQueue,
                    ..Default::default()
                };
                jetstream
                    .create_stream(stream_config)
                    .await
                    .map_err(|e| Error::stream_error(&stream_name, e.to_string()))?
            }
        };

        let consumer_config = consumer::pull::Config {
            name: Some(consumer_name.clone()),
            durable_name: Some(consumer_name.clone()),
            description: Some(format!("Workers of queue {name}")),
            ack_wait: config.ack_wait(),
            max_deliver: -1,
            ..Default::default()
        };
        let consumer: PullConsumer = stream
            .get_or_create_consumer(&consumer_name, consumer_config)
            .await
            .map_err(|e| Error::consumer_error(&consumer_name, e.to_string()))?;

        tracing::info!(
            target: TRACING_TARGET_QUEUE,
            queue = %name,
            stream = %stream_name,
            consumer = %consumer_name,
            "Queue ready"
        );

        Ok(Self {
            jetstream: jetstream.clone(),
            consumer,
            name: name.to_owned(),
            subject,
            consumer_name,
            fetch_timeout: config.fetch_timeout(),
        })
    }

    async fn publish(&self, payload: &str) -> Result<()> {
        self.jetstream
            .publish(self.subject.clone(), payload.to_owned().into())
            .await
            .map_err(|e| Error::delivery_failed(&self.subject, e.to_string()))?
            .await
            .map_err(|e| Error::delivery_failed(&self.subject, e.to_string()))?;

        tracing::debug!(
            target: TRACING_TARGET_QUEUE,
            subject = %self.subject,
            size_bytes = payload.len(),
            "Published message"
        );
        Ok(())
    }

    async fn fetch(&self) -> Result<Option<QueueMessage>> {
        let mut messages = self
            .consumer
            .fetch()
            .max_messages(1)
            .expires(self.fetch_timeout)
            .messages()
            .await
            .map_err(|e| Error::consumer_error(&self.consumer_name, e.to_string()))?;

        let message = match messages.next().await {
            None => return Ok(None),
            Some(Err(e)) => return Err(Error::consumer_error(&self.consumer_name, e.to_string())),
            Some(Ok(message)) => message,
        };

        let (id, attempt) = match message.info() {
            Ok(info) => (
                info.stream_sequence.to_string(),
                u32::try_from(info.delivered).unwrap_or(u32::MAX),
            ),
            Err(e) => {
                tracing::warn!(
                    target: TRACING_TARGET_QUEUE,
                    queue = %self.name,
                    error = %e,
                    "Message carries no delivery metadata"
                );
                (String::new(), 1)
            }
        };

        let body = match std::str::from_utf8(&message.payload) {
            Ok(text) => Some(text.to_owned()),
            Err(_) => {
                tracing::warn!(
                    target: TRACING_TARGET_QUEUE,
                    queue = %self.name,
                    message_id = %id,
                    "Message payload is not valid UTF-8"
                );
                None
            }
        };

        let acker = NatsAcker {
            queue: self.name.clone(),
            message,
        };
        Ok(Some(QueueMessage::new(id, body, attempt, acker)))
    }
}

impl fmt::Debug for CartQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartQueue")
            .field("name", &self.name)
            .field("subject", &self.subject)
            .field("consumer", &self.consumer_name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MessageQueue for CartQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, payload: &str) -> storefront_core::Result<()> {
        Ok(self.publish(payload).await?)
    }

    async fn receive(&self) -> storefront_core::Result<Option<QueueMessage>> {
        Ok(self.fetch().await?)
    }
}

struct NatsAcker {
    queue: String,
    message: jetstream::Message,
}

impl NatsAcker {
    async fn settle(&self, kind: AckKind) -> storefront_core::Result<()> {
        self.message
            .ack_with(kind)
            .await
            .map_err(|e| Error::ack_failed(&self.queue, e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl Acknowledge for NatsAcker {
    async fn ack(&self) -> storefront_core::Result<()> {
        self.settle(AckKind::Ack).await
    }

    async fn retry(&self, delay: Duration) -> storefront_core::Result<()> {
        self.settle(AckKind::Nak(Some(delay))).await
    }

    async fn reject(&self) -> storefront_core::Result<()> {
        self.settle(AckKind::Term).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_for_plain_queue() {
        assert_eq!(stream_name("cartqueue"), "QUEUE_CARTQUEUE");
        assert_eq!(subject("cartqueue"), "queue.cartqueue");
        assert_eq!(consumer_name("cartqueue"), "cartqueue_worker");
    }

    #[test]
    fn names_for_dead_letter_queue() {
        assert_eq!(stream_name("cartqueue-poison"), "QUEUE_CARTQUEUE-POISON");
        assert_eq!(subject("cartqueue-poison"), "queue.cartqueue-poison");
    }

    #[test]
    fn reserved_characters_are_replaced() {
        assert_eq!(subject("cart.queue>*"), "queue.cart_queue__");
        assert_eq!(stream_name("a b"), "QUEUE_A_B");
    }
}
