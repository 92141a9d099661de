//! Second stage: decode, re-encode and store a cart artifact.

use bytes::Bytes;
use storefront_core::store::{BlobStore, StoredArtifact};
use storefront_core::types::{ArtifactHeaders, ArtifactKey, Product};

use super::IngestError;

/// Decodes a validated payload into a [`Product`], ignoring field-name case.
pub fn decode_product(payload: &str) -> Result<Product, IngestError> {
    Ok(Product::from_json_case_insensitive(payload)?)
}

/// Encodes a product as the indented JSON body of a cart artifact.
pub fn encode_product(product: &Product) -> Result<String, IngestError> {
    product.to_pretty_json().map_err(IngestError::Encode)
}

/// Writes `body` to a fresh `cart_<uuid>.json` object in `container`,
/// creating the container first if needed.
pub async fn store_artifact(
    store: &dyn BlobStore,
    container: &str,
    headers: &ArtifactHeaders,
    body: String,
) -> Result<StoredArtifact, IngestError> {
    store
        .ensure_container(container)
        .await
        .map_err(IngestError::Store)?;

    let key = ArtifactKey::generate();
    store
        .put(container, &key.to_string(), Bytes::from(body), headers)
        .await
        .map_err(IngestError::Store)
}

#[cfg(test)]
mod tests {
    use storefront_core::memory::MemoryBlobStore;
    use storefront_core::types::{BigDecimal, ProductDecodeError};

    use super::*;

    #[test]
    fn decode_null_is_decode_error() {
        let err = decode_product("null").err();
        assert!(matches!(err, Some(IngestError::Decode(ProductDecodeError::Null))));
    }

    #[test]
    fn encode_then_decode_preserves_product() -> anyhow::Result<()> {
        let product = Product::new(3, "Tasse à café", "4.5".parse::<BigDecimal>()?).with_description("Grès");
        let body = encode_product(&product)?;
        assert_eq!(decode_product(&body)?, product);
        Ok(())
    }

    #[tokio::test]
    async fn store_creates_container_and_object() -> anyhow::Result<()> {
        let store = MemoryBlobStore::new();
        let headers = ArtifactHeaders::inline_json(30);

        let artifact = store_artifact(&store, "cart", &headers, "{}".to_owned()).await?;

        assert!(store.has_container("cart").await);
        assert!(ArtifactKey::matches(&artifact.key));
        assert_eq!(store.headers("cart", &artifact.key).await?, Some(headers));
        Ok(())
    }
}
