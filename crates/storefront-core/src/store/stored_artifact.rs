//! Receipt of a completed blob write.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Describes an object written by [`BlobStore::put`](super::BlobStore::put).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredArtifact {
    /// Container holding the object.
    pub container: String,
    /// Object name within the container.
    pub key: String,
    /// Size of the body in bytes.
    pub size: u64,
    /// Hex-encoded SHA-256 of the body.
    pub sha256: String,
}

impl StoredArtifact {
    /// Builds the receipt for `body` written to `container/key`.
    pub fn new(container: impl Into<String>, key: impl Into<String>, body: &[u8]) -> Self {
        Self {
            container: container.into(),
            key: key.into(),
            size: body.len() as u64,
            sha256: hex::encode(Sha256::digest(body)),
        }
    }

    /// Returns the `container/key` path of the object.
    pub fn path(&self) -> String {
        format!("{}/{}", self.container, self.key)
    }
}
