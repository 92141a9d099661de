//! Convenient re-exports for common use.

pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::queue::{
    Acknowledge, MessageQueue, QueueMessage, RetryDecision, RetryPolicy,
};
pub use crate::store::{BlobStore, LoginLog, ProfileStore, StoredArtifact};
pub use crate::types::{
    ArtifactHeaders, ArtifactKey, CustomerProfile, LoginRecord, Product, ProductDecodeError,
};
