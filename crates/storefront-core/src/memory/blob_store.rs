use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;

use crate::store::{BlobStore, StoredArtifact};
use crate::types::ArtifactHeaders;
use crate::{Result, TRACING_TARGET_MEMORY};

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Bytes,
    headers: ArtifactHeaders,
}

type Containers = HashMap<String, BTreeMap<String, StoredObject>>;

/// Blob store kept in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    containers: Arc<Mutex<Containers>>,
    accesses: Arc<AtomicUsize>,
}

impl MemoryBlobStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls made through the [`BlobStore`] trait.
    pub fn access_count(&self) -> usize {
        self.accesses.load(Ordering::SeqCst)
    }

    /// Number of objects in `container`.
    pub async fn object_count(&self, container: &str) -> usize {
        self.containers
            .lock()
            .await
            .get(container)
            .map_or(0, BTreeMap::len)
    }

    /// Returns true if `container` has been created.
    pub async fn has_container(&self, container: &str) -> bool {
        self.containers.lock().await.contains_key(container)
    }

    fn touch(&self) {
        self.accesses.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn ensure_container(&self, container: &str) -> Result<()> {
        self.touch();
        let mut containers = self.containers.lock().await;
        if !containers.contains_key(container) {
            tracing::debug!(
                target: TRACING_TARGET_MEMORY,
                container = %container,
                "Creating container"
            );
            containers.insert(container.to_owned(), BTreeMap::new());
        }
        Ok(())
    }

    async fn put(
        &self,
        container: &str,
        key: &str,
        bytes: Bytes,
        headers: &ArtifactHeaders,
    ) -> Result<StoredArtifact> {
        self.touch();
        let receipt = StoredArtifact::new(container, key, &bytes);
        let object = StoredObject {
            bytes,
            headers: headers.clone(),
        };

        let replaced = self
            .containers
            .lock()
            .await
            .entry(container.to_owned())
            .or_default()
            .insert(key.to_owned(), object)
            .is_some();

        if replaced {
            tracing::debug!(
                target: TRACING_TARGET_MEMORY,
                container = %container,
                key = %key,
                "Replaced existing object"
            );
        }

        Ok(receipt)
    }

    async fn get(&self, container: &str, key: &str) -> Result<Option<Bytes>> {
        self.touch();
        Ok(self
            .containers
            .lock()
            .await
            .get(container)
            .and_then(|objects| objects.get(key))
            .map(|object| object.bytes.clone()))
    }

    async fn headers(&self, container: &str, key: &str) -> Result<Option<ArtifactHeaders>> {
        self.touch();
        Ok(self
            .containers
            .lock()
            .await
            .get(container)
            .and_then(|objects| objects.get(key))
            .map(|object| object.headers.clone()))
    }

    async fn list(&self, container: &str) -> Result<Vec<String>> {
        self.touch();
        Ok(self
            .containers
            .lock()
            .await
            .get(container)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get() -> anyhow::Result<()> {
        let store = MemoryBlobStore::new();
        store.ensure_container("cart").await?;

        let headers = ArtifactHeaders::inline_json(30);
        let receipt = store
            .put("cart", "cart_a.json", Bytes::from_static(b"{}"), &headers)
            .await?;

        assert_eq!(receipt.size, 2);
        assert_eq!(
            store.get("cart", "cart_a.json").await?,
            Some(Bytes::from_static(b"{}"))
        );
        assert_eq!(store.headers("cart", "cart_a.json").await?, Some(headers));
        assert_eq!(store.list("cart").await?, vec!["cart_a.json".to_owned()]);
        Ok(())
    }

    #[tokio::test]
    async fn ensure_container_is_idempotent() -> anyhow::Result<()> {
        let store = MemoryBlobStore::new();
        store.ensure_container("cart").await?;
        store
            .put("cart", "k", Bytes::new(), &ArtifactHeaders::new())
            .await?;
        store.ensure_container("cart").await?;

        assert_eq!(store.object_count("cart").await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn missing_container_lists_empty() -> anyhow::Result<()> {
        let store = MemoryBlobStore::new();
        assert!(store.list("cart").await?.is_empty());
        assert!(store.get("cart", "k").await?.is_none());
        assert_eq!(store.access_count(), 2);
        Ok(())
    }
}
