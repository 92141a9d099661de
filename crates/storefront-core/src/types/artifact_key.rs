//! Keys of cart artifacts in blob storage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Prefix shared by every cart artifact key.
pub const ARTIFACT_KEY_PREFIX: &str = "cart_";

/// Suffix shared by every cart artifact key.
pub const ARTIFACT_KEY_SUFFIX: &str = ".json";

/// Name of a stored cart artifact, `cart_<uuid>.json`.
///
/// Every call to [`ArtifactKey::generate`] draws a fresh random UUID v4, so two
/// ingestions of the same product never share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactKey {
    id: Uuid,
}

impl ArtifactKey {
    /// Generates a new key with a random UUID.
    pub fn generate() -> Self {
        Self { id: Uuid::new_v4() }
    }

    /// Creates a key from an existing identifier.
    pub fn from_id(id: Uuid) -> Self {
        Self { id }
    }

    /// Returns the identifier embedded in the key.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns true if `name` has the shape of an artifact key.
    pub fn matches(name: &str) -> bool {
        name.parse::<Self>().is_ok()
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            ARTIFACT_KEY_PREFIX,
            self.id.hyphenated(),
            ARTIFACT_KEY_SUFFIX
        )
    }
}

impl FromStr for ArtifactKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let id = s
            .strip_prefix(ARTIFACT_KEY_PREFIX)
            .and_then(|rest| rest.strip_suffix(ARTIFACT_KEY_SUFFIX))
            .ok_or_else(|| {
                Error::invalid_input().with_message(format!(
                    "artifact key '{s}' must look like {ARTIFACT_KEY_PREFIX}<uuid>{ARTIFACT_KEY_SUFFIX}"
                ))
            })?;

        let id = Uuid::parse_str(id).map_err(|e| {
            Error::invalid_input()
                .with_message(format!("artifact key '{s}' has an invalid UUID"))
                .with_source(e)
        })?;

        Ok(Self { id })
    }
}

impl TryFrom<String> for ArtifactKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ArtifactKey> for String {
    fn from(key: ArtifactKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_has_expected_shape() {
        let key = ArtifactKey::generate().to_string();

        assert!(key.starts_with("cart_"));
        assert!(key.ends_with(".json"));
        assert_eq!(key.len(), "cart_".len() + 36 + ".json".len());
    }

    #[test]
    fn generated_keys_are_unique() {
        assert_ne!(ArtifactKey::generate(), ArtifactKey::generate());
    }

    #[test]
    fn parse_display_output() -> anyhow::Result<()> {
        let key = ArtifactKey::generate();
        let parsed: ArtifactKey = key.to_string().parse()?;
        assert_eq!(parsed, key);
        Ok(())
    }

    #[test]
    fn reject_foreign_names() {
        assert!(!ArtifactKey::matches("notes.txt"));
        assert!(!ArtifactKey::matches("cart_.json"));
        assert!(!ArtifactKey::matches("cart_not-a-uuid.json"));
        assert!(!ArtifactKey::matches(
            "order_67e55044-10b1-426f-9247-bb680e5fe0c8.json"
        ));
        assert!(ArtifactKey::matches(
            "cart_67e55044-10b1-426f-9247-bb680e5fe0c8.json"
        ));
    }
}
