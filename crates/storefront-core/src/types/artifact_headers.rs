//! Retrieval headers attached to stored artifacts.

use std::collections::BTreeMap;

use derive_more::{Deref, DerefMut};
use serde::{Deserialize, Serialize};

/// Header name for the MIME type of an artifact.
pub const CONTENT_TYPE: &str = "content-type";

/// Header name for the presentation hint of an artifact.
pub const CONTENT_DISPOSITION: &str = "content-disposition";

/// Header name for the caching lifetime of an artifact.
pub const CACHE_CONTROL: &str = "cache-control";

/// HTTP-like headers stored alongside an artifact.
///
/// Header names are kept lowercase.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[derive(Serialize, Deserialize, Deref, DerefMut)]
pub struct ArtifactHeaders {
    #[deref]
    #[deref_mut]
    headers: BTreeMap<String, String>,
}

impl ArtifactHeaders {
    /// Creates a new empty set of headers.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers for an inline JSON document cached for `max_age_secs` seconds.
    pub fn inline_json(max_age_secs: u64) -> Self {
        Self::new()
            .set(CONTENT_DISPOSITION, "inline")
            .set(CONTENT_TYPE, "application/json")
            .set(CACHE_CONTROL, format!("max-age={max_age_secs}"))
    }

    /// Sets a header value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(key.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Gets a header value by name.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns the content type, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.get(CONTENT_TYPE)
    }

    /// Returns the content disposition, if set.
    pub fn content_disposition(&self) -> Option<&str> {
        self.get(CONTENT_DISPOSITION)
    }

    /// Returns the cache control directive, if set.
    pub fn cache_control(&self) -> Option<&str> {
        self.get(CACHE_CONTROL)
    }
}
