//! Storage capabilities.
//!
//! Each trait describes the minimal surface a backend must offer. Backends
//! live in their own crates (`storefront-opendal`, `storefront-nats`) and the
//! [`memory`](crate::memory) module provides in-process versions for tests.

mod stored_artifact;

use async_trait::async_trait;
use bytes::Bytes;
pub use stored_artifact::StoredArtifact;

use crate::Result;
use crate::types::{ArtifactHeaders, CustomerProfile};

/// Durable, listable object storage organised in containers.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Creates the container if it does not exist yet.
    ///
    /// Succeeds without changes when the container is already present.
    async fn ensure_container(&self, container: &str) -> Result<()>;

    /// Writes `bytes` under `key` with the given headers, replacing any
    /// existing object of the same name.
    ///
    /// The object and its headers become visible together.
    async fn put(
        &self,
        container: &str,
        key: &str,
        bytes: Bytes,
        headers: &ArtifactHeaders,
    ) -> Result<StoredArtifact>;

    /// Reads an object, returning `None` if it does not exist.
    async fn get(&self, container: &str, key: &str) -> Result<Option<Bytes>>;

    /// Returns the headers stored with an object, if it exists.
    async fn headers(&self, container: &str, key: &str) -> Result<Option<ArtifactHeaders>>;

    /// Lists object names in a container. A missing container lists as empty.
    async fn list(&self, container: &str) -> Result<Vec<String>>;
}

/// Key-value table storage for customer profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Creates the table if it does not exist yet.
    async fn ensure_table(&self, table: &str) -> Result<()>;

    /// Inserts or replaces the profile at its partition and row key.
    async fn upsert(&self, table: &str, profile: &CustomerProfile) -> Result<()>;

    /// Looks up a profile by partition and row key.
    async fn get(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<CustomerProfile>>;
}

/// Append-only text files grouped into shares.
#[async_trait]
pub trait LoginLog: Send + Sync {
    /// Appends `line` to `file`, creating the share and the file as needed.
    ///
    /// Fails with [`ErrorKind::LimitExceeded`](crate::ErrorKind::LimitExceeded)
    /// when the file would grow past the backend's size limit.
    async fn append(&self, share: &str, file: &str, line: &str) -> Result<()>;

    /// Writes a whole file, replacing any previous content.
    async fn write(&self, share: &str, file: &str, content: &str) -> Result<()>;

    /// Reads a file, returning `None` if it does not exist.
    async fn read(&self, share: &str, file: &str) -> Result<Option<String>>;
}
