#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for NATS client operations.
///
/// Use this target for logging client initialization, configuration, and client-level errors.
pub const TRACING_TARGET_CLIENT: &str = "storefront_nats::client";

/// Tracing target for NATS connection operations.
///
/// Use this target for logging connection establishment, reconnection, and connection errors.
pub const TRACING_TARGET_CONNECTION: &str = "storefront_nats::connection";

/// Tracing target for work-queue operations.
///
/// Use this target for logging stream and consumer setup, fetches, and message settlement.
pub const TRACING_TARGET_QUEUE: &str = "storefront_nats::queue";

/// Tracing target for NATS key-value store operations.
pub const TRACING_TARGET_KV: &str = "storefront_nats::kv";

mod client;
mod error;
pub mod kv;
pub mod queue;

#[doc(hidden)]
pub mod prelude;

pub use async_nats::jetstream;
pub use client::{NatsClient, NatsConfig};
pub use error::{Error, Result};
