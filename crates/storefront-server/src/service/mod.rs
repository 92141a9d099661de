//! Application state and dependency injection.

mod config;
mod security;

use std::sync::Arc;

use storefront_core::memory::{
    MemoryBlobStore, MemoryLoginLog, MemoryProfileStore, MemoryQueue,
};
use storefront_core::queue::MessageQueue;
use storefront_core::store::{BlobStore, LoginLog, ProfileStore};

pub use crate::service::config::ServiceConfig;
pub use crate::service::security::PasswordHasher;
pub use crate::{Error, Result};

/// Application state.
///
/// Holds the storage and queue capabilities as trait objects, so handlers and
/// workers run unchanged against any backend. Used for the [`State`]
/// extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    // Capabilities:
    pub blob_store: Arc<dyn BlobStore>,
    pub profile_store: Arc<dyn ProfileStore>,
    pub login_log: Arc<dyn LoginLog>,
    pub cart_queue: Arc<dyn MessageQueue>,

    // Internal services:
    pub password_hasher: PasswordHasher,
    pub config: ServiceConfig,
}

impl ServiceState {
    /// Assembles application state from already connected capabilities.
    ///
    /// Fails if the configuration is invalid or if `cart_queue` is bound to a
    /// different queue than [`ServiceConfig::cart_queue`].
    pub fn new(
        config: ServiceConfig,
        blob_store: Arc<dyn BlobStore>,
        profile_store: Arc<dyn ProfileStore>,
        login_log: Arc<dyn LoginLog>,
        cart_queue: Arc<dyn MessageQueue>,
    ) -> Result<Self> {
        config.validate()?;

        if cart_queue.name() != config.cart_queue {
            return Err(Error::config(format!(
                "cart queue handle is bound to '{}', expected '{}'",
                cart_queue.name(),
                config.cart_queue
            )));
        }

        Ok(Self {
            blob_store,
            profile_store,
            login_log,
            cart_queue,
            password_hasher: PasswordHasher::new(),
            config,
        })
    }

    /// Creates state backed entirely by process memory.
    pub fn in_memory(config: ServiceConfig) -> Result<Self> {
        let cart_queue = MemoryQueue::new(config.cart_queue.clone());

        Self::new(
            config,
            Arc::new(MemoryBlobStore::new()),
            Arc::new(MemoryProfileStore::new()),
            Arc::new(MemoryLoginLog::new()),
            Arc::new(cart_queue),
        )
    }
}

impl std::fmt::Debug for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceState")
            .field("cart_queue", &self.cart_queue.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

// Capabilities:
impl_di!(blob_store: Arc<dyn BlobStore>);
impl_di!(profile_store: Arc<dyn ProfileStore>);
impl_di!(login_log: Arc<dyn LoginLog>);
impl_di!(cart_queue: Arc<dyn MessageQueue>);

// Internal services:
impl_di!(password_hasher: PasswordHasher);
impl_di!(config: ServiceConfig);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_state_uses_configured_queue() -> anyhow::Result<()> {
        let state = ServiceState::in_memory(ServiceConfig::default())?;
        assert_eq!(state.cart_queue.name(), "cartqueue");
        Ok(())
    }

    #[test]
    fn mismatched_queue_is_rejected() {
        let result = ServiceState::new(
            ServiceConfig::default(),
            Arc::new(MemoryBlobStore::new()),
            Arc::new(MemoryProfileStore::new()),
            Arc::new(MemoryLoginLog::new()),
            Arc::new(MemoryQueue::new("orders")),
        );
        assert!(result.is_err());
    }
}
