//! Monitor response types.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Service health report.
#[must_use]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatus {
    /// Timestamp when this status was generated.
    pub checked_at: Timestamp,
    /// Whether the service considers itself healthy.
    pub is_healthy: bool,
    /// Application version.
    pub version: String,
}

impl Default for MonitorStatus {
    fn default() -> Self {
        Self {
            checked_at: Timestamp::now(),
            is_healthy: true,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
