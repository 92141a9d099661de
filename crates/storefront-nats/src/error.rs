//! Error types and utilities for NATS operations.

use std::time::Duration;

use storefront_core::ErrorKind;

/// Result type for all NATS operations in this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for NATS operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// NATS client/connection errors
    #[error("NATS connection error: {0}")]
    Connection(#[from] async_nats::Error),

    /// Serialization errors when storing or loading values
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Operation timeout
    #[error("Operation timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// Message delivery failed
    #[error("Message delivery failed to subject '{subject}': {reason}")]
    DeliveryFailed { subject: String, reason: String },

    /// Stream operation failed
    #[error("Stream operation failed on '{stream}': {error}")]
    StreamError { stream: String, error: String },

    /// Consumer operation failed
    #[error("Consumer '{consumer}' error: {reason}")]
    ConsumerError { consumer: String, reason: String },

    /// Settling a message failed
    #[error("Failed to settle message on '{queue}': {reason}")]
    AckFailed { queue: String, reason: String },

    /// KV bucket operation failed
    #[error("KV operation failed on bucket '{bucket}': {reason}")]
    KvError { bucket: String, reason: String },

    /// Invalid configuration
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Generic operation error with context
    #[error("NATS operation failed: {operation} - {details}")]
    Operation { operation: String, details: String },
}

impl Error {
    /// Create a delivery failed error
    pub fn delivery_failed(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DeliveryFailed {
            subject: subject.into(),
            reason: reason.into(),
        }
    }

    /// Create a stream error
    pub fn stream_error(stream: impl Into<String>, error: impl Into<String>) -> Self {
        Self::StreamError {
            stream: stream.into(),
            error: error.into(),
        }
    }

    /// Create a consumer error
    pub fn consumer_error(consumer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConsumerError {
            consumer: consumer.into(),
            reason: reason.into(),
        }
    }

    /// Create a message settlement error
    pub fn ack_failed(queue: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AckFailed {
            queue: queue.into(),
            reason: reason.into(),
        }
    }

    /// Create a KV error
    pub fn kv_error(bucket: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::KvError {
            bucket: bucket.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an operation error with context
    pub fn operation(op: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Operation {
            operation: op.into(),
            details: details.into(),
        }
    }

    /// Create a timeout error with the given duration
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout { timeout: duration }
    }

    /// Returns the capability error kind this error maps to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Serialization(_) => ErrorKind::Serialization,
            Error::InvalidConfig { .. } => ErrorKind::Configuration,
            Error::KvError { .. } => ErrorKind::Storage,
            Error::Connection(_)
            | Error::DeliveryFailed { .. }
            | Error::StreamError { .. }
            | Error::ConsumerError { .. }
            | Error::AckFailed { .. }
            | Error::Operation { .. } => ErrorKind::Queue,
        }
    }
}

impl From<Error> for storefront_core::Error {
    fn from(err: Error) -> Self {
        storefront_core::Error::new(err.kind())
            .with_message(err.to_string())
            .with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_capability_errors() {
        assert_eq!(
            Error::timeout(Duration::from_secs(1)).kind(),
            ErrorKind::Timeout
        );
        assert_eq!(Error::kv_error("b", "x").kind(), ErrorKind::Storage);
        assert_eq!(Error::invalid_config("x").kind(), ErrorKind::Configuration);
        assert_eq!(
            Error::delivery_failed("queue.cart", "x").kind(),
            ErrorKind::Queue
        );
    }

    #[test]
    fn converted_error_keeps_message() {
        let error: storefront_core::Error = Error::stream_error("QUEUE_CART", "gone").into();

        assert_eq!(error.kind, ErrorKind::Queue);
        assert!(error.is_transient());
        assert_eq!(
            error.message.as_deref(),
            Some("Stream operation failed on 'QUEUE_CART': gone")
        );
    }
}
