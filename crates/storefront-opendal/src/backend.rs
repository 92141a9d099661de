//! Storage backend implementation.

use async_trait::async_trait;
use bytes::Bytes;
use opendal::{Capability, ErrorKind, Operator, services};
use storefront_core::store::{BlobStore, LoginLog, StoredArtifact};
use storefront_core::types::ArtifactHeaders;

use crate::TRACING_TARGET;
use crate::config::{BackendType, StorageConfig};
use crate::error::{StorageError, StorageResult};

/// Directory inside each container holding header sidecars.
const HEADERS_DIR: &str = ".headers";

/// Unified storage backend that wraps an OpenDAL operator.
///
/// Containers and shares are top-level directories below the configured root.
#[derive(Clone)]
pub struct StorageBackend {
    operator: Operator,
    config: StorageConfig,
}

impl StorageBackend {
    /// Creates a new storage backend from configuration.
    pub fn new(config: StorageConfig) -> StorageResult<Self> {
        config.validate().map_err(StorageError::init)?;
        let operator = Self::create_operator(&config)?;

        tracing::info!(
            target: TRACING_TARGET,
            backend = %config.storage_backend,
            root = %config.storage_root,
            "Storage backend initialized"
        );

        Ok(Self { operator, config })
    }

    /// Returns the configuration for this backend.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Returns the backend type.
    pub fn backend_type(&self) -> BackendType {
        self.config.storage_backend
    }

    fn capability(&self) -> Capability {
        self.operator.info().full_capability()
    }

    fn header_sidecars(&self) -> bool {
        let cap = self.capability();
        !(cap.write_with_content_type
            && cap.write_with_content_disposition
            && cap.write_with_cache_control)
    }

    async fn read_optional(&self, path: &str) -> StorageResult<Option<Bytes>> {
        match self.operator.read(path).await {
            Ok(buffer) => Ok(Some(buffer.to_bytes())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn size_of(&self, path: &str) -> StorageResult<u64> {
        match self.operator.stat(path).await {
            Ok(meta) => Ok(meta.content_length()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Creates a directory unless the backend has no notion of directories.
    async fn ensure_dir(&self, name: &str) -> StorageResult<()> {
        if !self.capability().create_dir {
            return Ok(());
        }
        self.operator.create_dir(&format!("{name}/")).await?;
        Ok(())
    }

    async fn write_object(
        &self,
        container: &str,
        key: &str,
        bytes: Bytes,
        headers: &ArtifactHeaders,
    ) -> StorageResult<()> {
        let path = object_path(container, key);
        let cap = self.capability();

        // Sidecar first so an object is never visible without its headers.
        let sidecar = if self.header_sidecars() {
            let path = sidecar_path(container, key);
            self.operator
                .write(&path, serde_json::to_vec(headers)?)
                .await?;
            Some(path)
        } else {
            None
        };

        let mut write = self.operator.write_with(&path, bytes);
        if let Some(value) = headers.content_type()
            && cap.write_with_content_type
        {
            write = write.content_type(value);
        }
        if let Some(value) = headers.content_disposition()
            && cap.write_with_content_disposition
        {
            write = write.content_disposition(value);
        }
        if let Some(value) = headers.cache_control()
            && cap.write_with_cache_control
        {
            write = write.cache_control(value);
        }

        if let Err(err) = write.await {
            if let Some(sidecar) = sidecar {
                self.remove_orphan_sidecar(&sidecar).await;
            }
            return Err(err.into());
        }
        Ok(())
    }

    /// Deletes the sidecar of an object whose write failed.
    async fn remove_orphan_sidecar(&self, path: &str) {
        if let Err(err) = self.operator.delete(path).await {
            tracing::warn!(
                target: TRACING_TARGET,
                path = %path,
                error = %err,
                "Failed to remove orphaned header sidecar"
            );
        }
    }

    async fn read_headers(&self, container: &str, key: &str) -> StorageResult<Option<ArtifactHeaders>> {
        if let Some(sidecar) = self.read_optional(&sidecar_path(container, key)).await? {
            return Ok(Some(serde_json::from_slice(&sidecar)?));
        }

        let meta = match self.operator.stat(&object_path(container, key)).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut headers = ArtifactHeaders::new();
        if let Some(value) = meta.content_type() {
            headers = headers.set(storefront_core::types::CONTENT_TYPE, value);
        }
        if let Some(value) = meta.content_disposition() {
            headers = headers.set(storefront_core::types::CONTENT_DISPOSITION, value);
        }
        if let Some(value) = meta.cache_control() {
            headers = headers.set(storefront_core::types::CACHE_CONTROL, value);
        }
        Ok(Some(headers))
    }

    async fn list_files(&self, container: &str) -> StorageResult<Vec<String>> {
        let entries = match self.operator.list(&format!("{container}/")).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names: Vec<String> = entries
            .into_iter()
            .filter(|entry| entry.metadata().is_file())
            .map(|entry| entry.name().to_owned())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn append_line(&self, share: &str, file: &str, line: &str) -> StorageResult<()> {
        let path = object_path(share, file);
        let limit = self.config.storage_max_file_bytes;

        if self.capability().write_can_append {
            let current = self.size_of(&path).await?;
            if current + line.len() as u64 > limit {
                return Err(StorageError::limit_exceeded(format!(
                    "'{path}' would exceed {limit} bytes"
                )));
            }
            self.operator
                .write_with(&path, line.to_owned())
                .append(true)
                .await?;
            return Ok(());
        }

        let mut content = self
            .read_optional(&path)
            .await?
            .map(|bytes| bytes.to_vec())
            .unwrap_or_default();
        if (content.len() + line.len()) as u64 > limit {
            return Err(StorageError::limit_exceeded(format!(
                "'{path}' would exceed {limit} bytes"
            )));
        }
        content.extend_from_slice(line.as_bytes());
        self.operator.write(&path, content).await?;
        Ok(())
    }

    /// Creates an OpenDAL operator based on configuration.
    #[allow(unreachable_patterns)]
    fn create_operator(config: &StorageConfig) -> StorageResult<Operator> {
        match config.storage_backend {
            BackendType::Fs => {
                let builder = services::Fs::default().root(&config.storage_root);
                Operator::new(builder)
                    .map(|op| op.finish())
                    .map_err(|e| StorageError::init(e.to_string()))
            }

            BackendType::Memory => {
                let builder = services::Memory::default().root(&config.storage_root);
                Operator::new(builder)
                    .map(|op| op.finish())
                    .map_err(|e| StorageError::init(e.to_string()))
            }

            #[cfg(feature = "azblob")]
            BackendType::AzureBlob => {
                let mut builder = services::Azblob::default().root(&config.storage_root);

                if let Some(ref container) = config.storage_azblob_container {
                    builder = builder.container(container);
                }

                if let Some(ref account_name) = config.storage_azblob_account_name {
                    builder = builder.account_name(account_name);
                }

                if let Some(ref account_key) = config.storage_azblob_account_key {
                    builder = builder.account_key(account_key);
                }

                if let Some(ref endpoint) = config.storage_azblob_endpoint {
                    builder = builder.endpoint(endpoint);
                }

                Operator::new(builder)
                    .map(|op| op.finish())
                    .map_err(|e| StorageError::init(e.to_string()))
            }

            _ => Err(StorageError::init(format!(
                "Backend type {} is not supported with current features",
                config.storage_backend
            ))),
        }
    }
}

fn object_path(container: &str, key: &str) -> String {
    format!("{container}/{key}")
}

fn sidecar_path(container: &str, key: &str) -> String {
    format!("{container}/{HEADERS_DIR}/{key}")
}

impl std::fmt::Debug for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageBackend")
            .field("backend_type", &self.config.storage_backend)
            .field("root", &self.config.storage_root)
            .finish()
    }
}

#[async_trait]
impl BlobStore for StorageBackend {
    async fn ensure_container(&self, container: &str) -> storefront_core::Result<()> {
        tracing::debug!(
            target: TRACING_TARGET,
            container = %container,
            "Ensuring container"
        );
        Ok(self.ensure_dir(container).await?)
    }

    async fn put(
        &self,
        container: &str,
        key: &str,
        bytes: Bytes,
        headers: &ArtifactHeaders,
    ) -> storefront_core::Result<StoredArtifact> {
        let receipt = StoredArtifact::new(container, key, &bytes);
        self.write_object(container, key, bytes, headers).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            path = %receipt.path(),
            size = receipt.size,
            "Object written"
        );
        Ok(receipt)
    }

    async fn get(&self, container: &str, key: &str) -> storefront_core::Result<Option<Bytes>> {
        Ok(self.read_optional(&object_path(container, key)).await?)
    }

    async fn headers(
        &self,
        container: &str,
        key: &str,
    ) -> storefront_core::Result<Option<ArtifactHeaders>> {
        Ok(self.read_headers(container, key).await?)
    }

    async fn list(&self, container: &str) -> storefront_core::Result<Vec<String>> {
        Ok(self.list_files(container).await?)
    }
}

#[async_trait]
impl LoginLog for StorageBackend {
    async fn append(&self, share: &str, file: &str, line: &str) -> storefront_core::Result<()> {
        self.ensure_dir(share).await?;
        self.append_line(share, file, line).await?;

        tracing::trace!(
            target: TRACING_TARGET,
            share = %share,
            file = %file,
            "Line appended"
        );
        Ok(())
    }

    async fn write(&self, share: &str, file: &str, content: &str) -> storefront_core::Result<()> {
        let limit = self.config.storage_max_file_bytes;
        if content.len() as u64 > limit {
            return Err(StorageError::limit_exceeded(format!(
                "'{share}/{file}' would exceed {limit} bytes"
            ))
            .into());
        }

        self.ensure_dir(share).await?;
        self.operator
            .write(&object_path(share, file), content.to_owned())
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    async fn read(&self, share: &str, file: &str) -> storefront_core::Result<Option<String>> {
        let Some(bytes) = self.read_optional(&object_path(share, file)).await? else {
            return Ok(None);
        };
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|e| StorageError::read(format!("'{share}/{file}' is not UTF-8: {e}")))?;
        Ok(Some(text))
    }
}

#[cfg(test)]
mod tests {
    use storefront_core::ErrorKind as CoreErrorKind;

    use super::*;

    fn fs_backend(dir: &tempfile::TempDir) -> anyhow::Result<StorageBackend> {
        let root = dir.path().to_string_lossy().into_owned();
        Ok(StorageBackend::new(StorageConfig::fs(root))?)
    }

    #[tokio::test]
    async fn fs_put_get_list_headers() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let backend = fs_backend(&dir)?;
        let headers = ArtifactHeaders::inline_json(30);

        backend.ensure_container("cart").await?;
        backend.ensure_container("cart").await?;
        let receipt = backend
            .put("cart", "cart_a.json", Bytes::from_static(b"{}"), &headers)
            .await?;

        assert_eq!(receipt.path(), "cart/cart_a.json");
        assert!(dir.path().join("cart").join("cart_a.json").exists());
        assert_eq!(
            backend.get("cart", "cart_a.json").await?,
            Some(Bytes::from_static(b"{}"))
        );
        assert_eq!(backend.list("cart").await?, vec!["cart_a.json".to_owned()]);

        let stored = backend
            .headers("cart", "cart_a.json")
            .await?
            .expect("headers should exist");
        assert_eq!(stored.content_type(), Some("application/json"));
        assert_eq!(stored.content_disposition(), Some("inline"));
        assert_eq!(stored.cache_control(), Some("max-age=30"));
        Ok(())
    }

    #[tokio::test]
    async fn failed_object_write_leaves_no_sidecar() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let backend = fs_backend(&dir)?;
        let headers = ArtifactHeaders::inline_json(30);

        // A directory where the object file should go makes the write fail.
        std::fs::create_dir_all(dir.path().join("cart").join("cart_c.json"))?;

        let result = backend
            .put("cart", "cart_c.json", Bytes::from_static(b"{}"), &headers)
            .await;

        assert!(result.is_err());
        assert!(
            !dir.path()
                .join("cart")
                .join(HEADERS_DIR)
                .join("cart_c.json")
                .exists()
        );
        Ok(())
    }

    #[tokio::test]
    async fn missing_objects_and_containers() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let backend = fs_backend(&dir)?;

        assert!(backend.list("cart").await?.is_empty());
        assert!(backend.get("cart", "nope.json").await?.is_none());
        assert!(backend.headers("cart", "nope.json").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn fs_append_creates_share_and_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let backend = fs_backend(&dir)?;

        backend.append("logreport", "report.txt", "one\n").await?;
        backend.append("logreport", "report.txt", "two\n").await?;

        assert_eq!(
            backend.read("logreport", "report.txt").await?.as_deref(),
            Some("one\ntwo\n")
        );
        Ok(())
    }

    #[tokio::test]
    async fn append_respects_size_limit() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path().to_string_lossy().into_owned();
        let backend = StorageBackend::new(StorageConfig::fs(root).with_max_file_bytes(5))?;

        backend.append("logreport", "report.txt", "abc").await?;
        let err = backend
            .append("logreport", "report.txt", "def")
            .await
            .unwrap_err();

        assert_eq!(err.kind, CoreErrorKind::LimitExceeded);
        assert_eq!(
            backend.read("logreport", "report.txt").await?.as_deref(),
            Some("abc")
        );
        Ok(())
    }

    #[tokio::test]
    async fn memory_backend_round_trip() -> anyhow::Result<()> {
        let backend = StorageBackend::new(StorageConfig::memory())?;
        let headers = ArtifactHeaders::inline_json(30);

        backend.ensure_container("cart").await?;
        backend
            .put("cart", "cart_b.json", Bytes::from_static(b"[]"), &headers)
            .await?;
        backend.append("logreport", "report.txt", "x\n").await?;
        backend.append("logreport", "report.txt", "y\n").await?;
        backend.write("logreport", "note.txt", "hello").await?;

        assert_eq!(backend.list("cart").await?, vec!["cart_b.json".to_owned()]);
        assert_eq!(
            backend.headers("cart", "cart_b.json").await?,
            Some(headers)
        );
        assert_eq!(
            backend.read("logreport", "report.txt").await?.as_deref(),
            Some("x\ny\n")
        );
        assert_eq!(
            backend.read("logreport", "note.txt").await?.as_deref(),
            Some("hello")
        );
        Ok(())
    }
}
