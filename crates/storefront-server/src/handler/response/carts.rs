//! Cart response types.

use serde::{Deserialize, Serialize};

/// Returned when a cart item has been placed on the ingestion queue.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemQueued {
    /// Human-readable outcome.
    pub message: String,
    /// Queue the item was published to.
    pub queue: String,
}

impl CartItemQueued {
    /// Creates the acknowledgement for `queue`.
    pub fn new(queue: impl Into<String>) -> Self {
        Self {
            message: "Cart item queued.".to_owned(),
            queue: queue.into(),
        }
    }
}
