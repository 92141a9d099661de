//! Prelude module for storefront-nats.
//!
//! ```rust,ignore
//! use storefront_nats::prelude::*;
//!
//! let client = NatsClient::connect(NatsConfig::default()).await?;
//! let queue = client.cart_queue("cartqueue").await?;
//! ```

pub use crate::client::{NatsClient, NatsConfig};
pub use crate::error::{Error, Result};
pub use crate::kv::ProfileBucket;
pub use crate::queue::CartQueue;
