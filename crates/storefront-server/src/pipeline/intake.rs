//! First stage: reject messages that can never become a product.

use serde::de::IgnoredAny;

use super::IngestError;

/// Checks that a message has a body and that the body is well-formed JSON.
///
/// Whitespace-only bodies are not empty and fail as [`IngestError::Format`].
/// The JSON is parsed without building a value; what it contains is checked
/// by the persistence stage.
pub fn validate_message(payload: Option<&str>) -> Result<&str, IngestError> {
    let payload = match payload {
        Some(payload) if !payload.is_empty() => payload,
        _ => return Err(IngestError::Validation),
    };

    serde_json::from_str::<IgnoredAny>(payload).map_err(IngestError::Format)?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::IngestErrorKind;

    fn kind(payload: Option<&str>) -> Option<IngestErrorKind> {
        validate_message(payload).err().map(|e| e.kind())
    }

    #[test]
    fn absent_and_empty_are_validation_errors() {
        assert_eq!(kind(None), Some(IngestErrorKind::Validation));
        assert_eq!(kind(Some("")), Some(IngestErrorKind::Validation));
    }

    #[test]
    fn malformed_json_is_format_error() {
        assert_eq!(kind(Some("not json")), Some(IngestErrorKind::Format));
        assert_eq!(kind(Some("   ")), Some(IngestErrorKind::Format));
        assert_eq!(kind(Some(r#"{"Id": 1"#)), Some(IngestErrorKind::Format));
        assert_eq!(kind(Some(r#"{"Id": 1} {}"#)), Some(IngestErrorKind::Format));
    }

    #[test]
    fn any_json_value_passes() -> anyhow::Result<()> {
        assert_eq!(validate_message(Some(r#"{"Id":1}"#))?, r#"{"Id":1}"#);
        assert!(validate_message(Some("null")).is_ok());
        assert!(validate_message(Some(" [1, 2] ")).is_ok());
        Ok(())
    }
}
