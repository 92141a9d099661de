//! Failures of a single cart ingestion.

use storefront_core::types::ProductDecodeError;
use strum::{Display, IntoStaticStr};

/// Why a cart message could not be turned into a stored artifact.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The message had no body, or an empty one.
    #[error("message is empty")]
    Validation,

    /// The message body is not well-formed JSON.
    #[error("message is not valid JSON: {0}")]
    Format(#[source] serde_json::Error),

    /// The JSON does not describe a product.
    #[error("message is not a product: {0}")]
    Decode(#[from] ProductDecodeError),

    /// The decoded product could not be written back out as JSON.
    #[error("cart artifact could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),

    /// The blob store failed to create the container or write the artifact.
    #[error("cart artifact could not be stored: {0}")]
    Store(#[source] storefront_core::Error),
}

/// Classification of [`IngestError`], used in logs and dispositions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum IngestErrorKind {
    Validation,
    Format,
    Decode,
    Encode,
    Store,
}

impl IngestError {
    /// Returns the classification of this error.
    pub fn kind(&self) -> IngestErrorKind {
        match self {
            Self::Validation => IngestErrorKind::Validation,
            Self::Format(_) => IngestErrorKind::Format,
            Self::Decode(_) => IngestErrorKind::Decode,
            Self::Encode(_) => IngestErrorKind::Encode,
            Self::Store(_) => IngestErrorKind::Store,
        }
    }

    /// Returns true if the message should be redelivered.
    ///
    /// Validation and format failures are final: redelivering the same bytes
    /// cannot succeed. Decode, encode and store failures are handed back to
    /// the queue so the retry policy can decide between another attempt and
    /// the dead-letter queue.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            IngestErrorKind::Decode | IngestErrorKind::Encode | IngestErrorKind::Store
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds() -> anyhow::Result<()> {
        assert!(!IngestError::Validation.is_retryable());

        let syntax = serde_json::from_str::<serde_json::Value>("not json")
            .err()
            .ok_or_else(|| anyhow::anyhow!("parsed invalid JSON"))?;
        assert!(!IngestError::Format(syntax).is_retryable());

        assert!(IngestError::Decode(ProductDecodeError::Null).is_retryable());
        assert!(IngestError::Store(storefront_core::Error::storage()).is_retryable());
        Ok(())
    }

    #[test]
    fn encode_failures_are_classified_apart_from_decode() -> anyhow::Result<()> {
        let source = serde_json::from_str::<serde_json::Value>("[")
            .err()
            .ok_or_else(|| anyhow::anyhow!("parsed invalid JSON"))?;
        let err = IngestError::Encode(source);

        assert_eq!(err.kind(), IngestErrorKind::Encode);
        assert_eq!(err.kind().to_string(), "encode");
        assert!(err.to_string().starts_with("cart artifact could not be encoded"));
        assert!(err.is_retryable());
        Ok(())
    }

    #[test]
    fn kind_names() {
        assert_eq!(IngestErrorKind::Validation.to_string(), "validation");
        assert_eq!(IngestError::Validation.kind(), IngestErrorKind::Validation);
    }
}
