//! Middleware for `axum::Router` and HTTP request processing.
//!
//! - Observability: request IDs, request tracing, request timing
//! - Recovery: timeouts, panics and tower service errors
//!
//! ```rust,no_run
//! use storefront_server::handler::routes;
//! use storefront_server::middleware::{RecoveryConfig, RouterObservabilityExt, RouterRecoveryExt};
//! use storefront_server::service::{ServiceConfig, ServiceState};
//!
//! # fn main() -> anyhow::Result<()> {
//! let state = ServiceState::in_memory(ServiceConfig::default())?;
//! let app = routes(state)
//!     .with_recovery(&RecoveryConfig::default())
//!     .with_observability()
//!     .with_metrics();
//! # Ok(())
//! # }
//! ```

mod observability;
mod recovery;

pub use observability::{RouterObservabilityExt, track_request_metrics};
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
