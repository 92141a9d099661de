//! Storage configuration types.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

const DEFAULT_ROOT: &str = "./data";
const DEFAULT_MAX_FILE_BYTES: u64 = 1024 * 1024;

/// OpenDAL service used by [`StorageBackend`](crate::StorageBackend).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[cfg_attr(feature = "config", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BackendType {
    /// Local filesystem under `root`.
    #[default]
    Fs,
    /// Process memory; contents are lost on exit.
    Memory,
    /// Azure Blob Storage container, `root` is the path prefix inside it.
    #[serde(rename = "azblob")]
    #[strum(serialize = "azblob")]
    #[cfg_attr(feature = "config", value(name = "azblob"))]
    AzureBlob,
}

/// Storage backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct StorageConfig {
    /// Storage service
    #[cfg_attr(
        feature = "config",
        arg(long = "storage-backend", env = "STORAGE_BACKEND", value_enum, default_value = "fs")
    )]
    pub storage_backend: BackendType,

    /// Root directory or path prefix
    #[cfg_attr(
        feature = "config",
        arg(long = "storage-root", env = "STORAGE_ROOT", default_value = DEFAULT_ROOT)
    )]
    pub storage_root: String,

    /// Azure Blob container name
    #[cfg_attr(
        feature = "config",
        arg(long = "storage-azblob-container", env = "STORAGE_AZBLOB_CONTAINER")
    )]
    pub storage_azblob_container: Option<String>,

    /// Azure storage account name
    #[cfg_attr(
        feature = "config",
        arg(long = "storage-azblob-account-name", env = "STORAGE_AZBLOB_ACCOUNT_NAME")
    )]
    pub storage_azblob_account_name: Option<String>,

    /// Azure storage account key
    #[cfg_attr(
        feature = "config",
        arg(long = "storage-azblob-account-key", env = "STORAGE_AZBLOB_ACCOUNT_KEY", hide_env_values = true)
    )]
    #[serde(skip_serializing)]
    pub storage_azblob_account_key: Option<String>,

    /// Azure Blob endpoint, e.g. `https://<account>.blob.core.windows.net`
    #[cfg_attr(
        feature = "config",
        arg(long = "storage-azblob-endpoint", env = "STORAGE_AZBLOB_ENDPOINT")
    )]
    pub storage_azblob_endpoint: Option<String>,

    /// Size limit of a single append-only file, in bytes
    #[cfg_attr(
        feature = "config",
        arg(long = "storage-max-file-bytes", env = "STORAGE_MAX_FILE_BYTES", default_value_t = DEFAULT_MAX_FILE_BYTES)
    )]
    pub storage_max_file_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_backend: BackendType::Fs,
            storage_root: DEFAULT_ROOT.to_owned(),
            storage_azblob_container: None,
            storage_azblob_account_name: None,
            storage_azblob_account_key: None,
            storage_azblob_endpoint: None,
            storage_max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

impl StorageConfig {
    /// Creates a filesystem configuration rooted at `root`.
    pub fn fs(root: impl Into<String>) -> Self {
        Self {
            storage_root: root.into(),
            ..Self::default()
        }
    }

    /// Creates an in-memory configuration.
    pub fn memory() -> Self {
        Self {
            storage_backend: BackendType::Memory,
            storage_root: "/".to_owned(),
            ..Self::default()
        }
    }

    /// Sets the append-only file size limit.
    #[must_use]
    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.storage_max_file_bytes = max_file_bytes;
        self
    }

    /// Validate the configuration and return any issues.
    pub fn validate(&self) -> Result<(), String> {
        if self.storage_root.trim().is_empty() {
            return Err("Storage root cannot be empty".to_string());
        }
        if self.storage_max_file_bytes == 0 {
            return Err("Storage file size limit must be positive".to_string());
        }
        if self.storage_backend == BackendType::AzureBlob {
            if self.storage_azblob_container.is_none() {
                return Err("Azure Blob backend requires a container".to_string());
            }
            if self.storage_azblob_account_name.is_none() {
                return Err("Azure Blob backend requires an account name".to_string());
            }
        }
        Ok(())
    }
}
