//! The cart ingestion unit of work.

use std::sync::Arc;

use storefront_core::store::{BlobStore, StoredArtifact};
use storefront_core::types::ArtifactHeaders;

use super::{IngestError, TRACING_TARGET, intake, persistence};
use crate::service::{ServiceConfig, ServiceState};

/// Turns one queue message into one stored cart artifact.
///
/// Runs the intake checks, decodes the product, re-encodes it as pretty JSON
/// and writes it under a fresh key. Every failure is logged with its kind
/// before it is returned, so callers only decide what happens to the message.
#[derive(Clone)]
pub struct CartIngestor {
    store: Arc<dyn BlobStore>,
    container: String,
    headers: ArtifactHeaders,
}

impl CartIngestor {
    /// Creates an ingestor writing to `container` with inline JSON headers
    /// cached for `cache_max_age_secs`.
    pub fn new(
        store: Arc<dyn BlobStore>,
        container: impl Into<String>,
        cache_max_age_secs: u64,
    ) -> Self {
        Self {
            store,
            container: container.into(),
            headers: ArtifactHeaders::inline_json(cache_max_age_secs),
        }
    }

    /// Creates an ingestor from the application's blob store and names.
    pub fn from_state(state: &ServiceState) -> Self {
        Self::with_config(state.blob_store.clone(), &state.config)
    }

    /// Creates an ingestor for `store` using the names in `config`.
    pub fn with_config(store: Arc<dyn BlobStore>, config: &ServiceConfig) -> Self {
        Self::new(store, config.cart_container.clone(), config.cache_max_age_secs)
    }

    /// Container artifacts are written to.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Ingests a single message body.
    ///
    /// Validation and format failures return before the blob store is
    /// touched.
    #[tracing::instrument(skip_all, target = TRACING_TARGET, fields(container = %self.container))]
    pub async fn ingest(&self, payload: Option<&str>) -> Result<StoredArtifact, IngestError> {
        let result = self.run(payload).await;

        match &result {
            Ok(artifact) => {
                tracing::info!(
                    target: TRACING_TARGET,
                    key = %artifact.key,
                    size = artifact.size,
                    sha256 = %artifact.sha256,
                    "Cart artifact stored"
                );
            }
            Err(err) if err.is_retryable() => {
                tracing::error!(
                    target: TRACING_TARGET,
                    kind = %err.kind(),
                    error = %err,
                    "Cart ingestion failed"
                );
            }
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    kind = %err.kind(),
                    error = %err,
                    "Cart message rejected"
                );
            }
        }

        result
    }

    async fn run(&self, payload: Option<&str>) -> Result<StoredArtifact, IngestError> {
        let payload = intake::validate_message(payload)?;
        let product = persistence::decode_product(payload)?;

        tracing::debug!(
            target: TRACING_TARGET,
            product_id = product.id,
            product_name = ?product.name,
            "Decoded cart product"
        );

        let body = persistence::encode_product(&product)?;
        persistence::store_artifact(self.store.as_ref(), &self.container, &self.headers, body).await
    }
}

impl std::fmt::Debug for CartIngestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartIngestor")
            .field("container", &self.container)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use bytes::Bytes;
    use storefront_core::memory::MemoryBlobStore;
    use storefront_core::types::{ArtifactKey, BigDecimal, Product};

    use super::*;
    use crate::pipeline::IngestErrorKind;

    const CAFE: &str = r#"{"Id":1,"Name":"Café Mug","Price":9.99,"Description":"Ceramic"}"#;

    fn ingestor(store: &MemoryBlobStore) -> CartIngestor {
        CartIngestor::new(Arc::new(store.clone()), "cart", 30)
    }

    /// Blob store whose every operation fails as a storage outage.
    struct UnavailableBlobStore;

    #[async_trait]
    impl BlobStore for UnavailableBlobStore {
        async fn ensure_container(&self, _: &str) -> storefront_core::Result<()> {
            Err(storefront_core::Error::storage().with_message("connection refused"))
        }

        async fn put(
            &self,
            _: &str,
            _: &str,
            _: Bytes,
            _: &ArtifactHeaders,
        ) -> storefront_core::Result<StoredArtifact> {
            Err(storefront_core::Error::storage())
        }

        async fn get(&self, _: &str, _: &str) -> storefront_core::Result<Option<Bytes>> {
            Err(storefront_core::Error::storage())
        }

        async fn headers(
            &self,
            _: &str,
            _: &str,
        ) -> storefront_core::Result<Option<ArtifactHeaders>> {
            Err(storefront_core::Error::storage())
        }

        async fn list(&self, _: &str) -> storefront_core::Result<Vec<String>> {
            Err(storefront_core::Error::storage())
        }
    }

    #[tokio::test]
    async fn cafe_product_is_stored_as_pretty_json() -> anyhow::Result<()> {
        let store = MemoryBlobStore::new();

        let artifact = ingestor(&store).ingest(Some(CAFE)).await?;

        assert_eq!(artifact.container, "cart");
        assert!(ArtifactKey::matches(&artifact.key));

        let bytes = store
            .get("cart", &artifact.key)
            .await?
            .ok_or_else(|| anyhow::anyhow!("artifact missing"))?;
        let body = String::from_utf8(bytes.to_vec())?;
        assert!(body.contains("\"Name\": \"Café Mug\""));
        assert!(!body.contains("\\u"));
        assert_eq!(
            Product::from_json_case_insensitive(&body)?,
            Product::new(1, "Café Mug", "9.99".parse::<BigDecimal>()?).with_description("Ceramic")
        );

        let headers = store
            .headers("cart", &artifact.key)
            .await?
            .ok_or_else(|| anyhow::anyhow!("headers missing"))?;
        assert_eq!(headers.content_disposition(), Some("inline"));
        assert_eq!(headers.content_type(), Some("application/json"));
        assert_eq!(headers.cache_control(), Some("max-age=30"));
        Ok(())
    }

    #[tokio::test]
    async fn exact_price_and_null_name_are_stored() -> anyhow::Result<()> {
        let store = MemoryBlobStore::new();

        let artifact = ingestor(&store)
            .ingest(Some(r#"{"Id":1,"Name":null,"Price":12345678901234567.89}"#))
            .await?;

        let bytes = store
            .get("cart", &artifact.key)
            .await?
            .ok_or_else(|| anyhow::anyhow!("artifact missing"))?;
        let body = String::from_utf8(bytes.to_vec())?;
        assert!(body.contains("\"Name\": null"));
        assert!(body.contains("12345678901234567.89"));
        Ok(())
    }

    #[tokio::test]
    async fn rejected_messages_never_touch_the_store() {
        let store = MemoryBlobStore::new();
        let ingestor = ingestor(&store);

        for (payload, expected) in [
            (None, IngestErrorKind::Validation),
            (Some(""), IngestErrorKind::Validation),
            (Some("not json"), IngestErrorKind::Format),
        ] {
            let err = ingestor.ingest(payload).await.err().map(|e| e.kind());
            assert_eq!(err, Some(expected));
        }

        assert_eq!(store.access_count(), 0);
    }

    #[tokio::test]
    async fn identical_messages_get_distinct_keys() -> anyhow::Result<()> {
        let store = MemoryBlobStore::new();
        let ingestor = ingestor(&store);

        let first = ingestor.ingest(Some(CAFE)).await?;
        let second = ingestor.ingest(Some(CAFE)).await?;

        assert_ne!(first.key, second.key);
        assert_eq!(first.sha256, second.sha256);
        assert_eq!(store.object_count("cart").await, 2);
        Ok(())
    }

    #[tokio::test]
    async fn null_product_is_a_decode_error() {
        let store = MemoryBlobStore::new();

        let err = ingestor(&store).ingest(Some("null")).await.err();

        assert_eq!(err.map(|e| e.kind()), Some(IngestErrorKind::Decode));
        assert_eq!(store.object_count("cart").await, 0);
    }

    #[tokio::test]
    async fn storage_outage_is_a_retryable_store_error() {
        let ingestor = CartIngestor::new(Arc::new(UnavailableBlobStore), "cart", 30);

        let err = ingestor.ingest(Some(CAFE)).await.err();

        assert!(matches!(err, Some(IngestError::Store(_))));
        assert!(err.is_some_and(|e| e.is_retryable()));
    }
}
