//! Cart product record and its JSON codec.

use std::collections::BTreeMap;
use std::fmt;

use bigdecimal::BigDecimal;
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;

use crate::TRACING_TARGET_TYPES;

/// Canonical wire names of [`Product`] fields.
const FIELD_NAMES: [&str; 4] = ["Id", "Name", "Price", "Description"];

/// A product placed in a customer's cart.
///
/// Serialized with PascalCase field names, the format the cart listing reads
/// back from the `cart` container. Fields missing from a payload fall back to
/// their defaults. The price is an exact decimal and is written back with
/// the digits it was read with.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Product {
    /// Catalog identifier.
    pub id: i32,
    /// Display name; `null` in a payload is kept as `None`.
    pub name: Option<String>,
    /// Unit price. Not validated.
    #[serde(with = "decimal_number")]
    pub price: BigDecimal,
    /// Optional free-text description.
    pub description: Option<String>,
}

/// Reasons a payload can fail to become a [`Product`].
#[derive(Debug, thiserror::Error)]
pub enum ProductDecodeError {
    /// Payload is the JSON literal `null`.
    #[error("payload decoded to a null product")]
    Null,
    /// Payload is valid JSON but not an object.
    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },
    /// Payload is not JSON or a field has the wrong type.
    #[error("invalid product: {0}")]
    Invalid(#[from] serde_json::Error),
}

impl Product {
    /// Creates a new product.
    pub fn new(id: i32, name: impl Into<String>, price: BigDecimal) -> Self {
        Self {
            id,
            name: Some(name.into()),
            price,
            description: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Decodes a product from JSON, matching field names without regard to case.
    ///
    /// `{"id": 1}`, `{"ID": 1}` and `{"Id": 1}` all populate [`Product::id`].
    /// When several spellings of one field appear, the last one in the
    /// document wins. Unknown fields are ignored.
    pub fn from_json_case_insensitive(payload: &str) -> Result<Self, ProductDecodeError> {
        let entries = match serde_json::from_str::<Payload>(payload)? {
            Payload::Object(entries) => entries,
            Payload::Null => return Err(ProductDecodeError::Null),
            Payload::Other(found) => return Err(ProductDecodeError::NotAnObject { found }),
        };

        let canonical = serde_json::to_string(&canonicalize_fields(&entries))?;
        Ok(serde_json::from_str(&canonical)?)
    }

    /// Encodes the product as indented JSON.
    ///
    /// Non-ASCII characters are written verbatim, so `"Café"` stays `"Café"`.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Top-level shape of a payload, with object members in document order.
enum Payload {
    Null,
    Object(Vec<(String, Box<RawValue>)>),
    Other(&'static str),
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PayloadVisitor)
    }
}

struct PayloadVisitor;

impl<'de> Visitor<'de> for PayloadVisitor {
    type Value = Payload;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Payload, E> {
        Ok(Payload::Null)
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Payload, E> {
        Ok(Payload::Other("boolean"))
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Payload, E> {
        Ok(Payload::Other("number"))
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Payload, E> {
        Ok(Payload::Other("number"))
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Payload, E> {
        Ok(Payload::Other("number"))
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<Payload, E> {
        Ok(Payload::Other("string"))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Payload, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Payload::Other("array"))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Payload, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(FIELD_NAMES.len()));
        while let Some(entry) = map.next_entry::<String, Box<RawValue>>()? {
            entries.push(entry);
        }
        Ok(Payload::Object(entries))
    }
}

/// Picks the last member matching each [`FIELD_NAMES`] entry, under its
/// canonical spelling.
fn canonicalize_fields(entries: &[(String, Box<RawValue>)]) -> BTreeMap<&'static str, &RawValue> {
    let mut canonical = BTreeMap::new();

    for (key, value) in entries {
        let Some(name) = FIELD_NAMES
            .iter()
            .find(|name| name.eq_ignore_ascii_case(key))
        else {
            continue;
        };

        if *name != key {
            tracing::trace!(
                target: TRACING_TARGET_TYPES,
                from = %key,
                to = %name,
                "Renamed product field"
            );
        }
        if canonical.insert(*name, value.as_ref()).is_some() {
            tracing::debug!(
                target: TRACING_TARGET_TYPES,
                field = %name,
                "Duplicate product field, keeping the last value"
            );
        }
    }

    canonical
}

/// Serde adapter writing a [`BigDecimal`] as a bare JSON number.
mod decimal_number {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use serde::{Deserialize, Deserializer, Serialize, Serializer, de, ser};
    use serde_json::value::RawValue;

    pub fn serialize<S: Serializer>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = RawValue::from_string(value.to_string()).map_err(ser::Error::custom)?;
        raw.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigDecimal, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        let text = raw.get();

        if !text.starts_with(|c: char| c == '-' || c.is_ascii_digit()) {
            return Err(de::Error::invalid_type(
                de::Unexpected::Other(text),
                &"a JSON number",
            ));
        }
        BigDecimal::from_str(text).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(text: &str) -> BigDecimal {
        text.parse().expect("valid decimal literal")
    }

    #[test]
    fn decode_pascal_case() -> anyhow::Result<()> {
        let product = Product::from_json_case_insensitive(
            r#"{"Id":1,"Name":"Café Mug","Price":9.99,"Description":"Ceramic"}"#,
        )?;

        assert_eq!(
            product,
            Product::new(1, "Café Mug", price("9.99")).with_description("Ceramic")
        );
        Ok(())
    }

    #[test]
    fn decode_ignores_field_case() -> anyhow::Result<()> {
        let product = Product::from_json_case_insensitive(
            r#"{"id":7,"NAME":"Teapot","pRiCe":24.5,"description":null}"#,
        )?;

        assert_eq!(product, Product::new(7, "Teapot", price("24.5")));
        Ok(())
    }

    #[test]
    fn decode_fills_missing_fields_with_defaults() -> anyhow::Result<()> {
        let product = Product::from_json_case_insensitive(r#"{"name":"Spoon","extra":true}"#)?;

        assert_eq!(product.id, 0);
        assert_eq!(product.name.as_deref(), Some("Spoon"));
        assert_eq!(product.price, BigDecimal::from(0));
        assert_eq!(product.description, None);
        Ok(())
    }

    #[test]
    fn decode_accepts_null_name() -> anyhow::Result<()> {
        let product = Product::from_json_case_insensitive(r#"{"Id":1,"Name":null,"Price":1.5}"#)?;

        assert_eq!(product.name, None);
        assert_eq!(product.price, price("1.5"));

        let json = product.to_pretty_json()?;
        assert!(json.contains("\"Name\": null"));
        assert_eq!(Product::from_json_case_insensitive(&json)?, product);
        Ok(())
    }

    #[test]
    fn decode_keeps_last_duplicate_field() -> anyhow::Result<()> {
        let product = Product::from_json_case_insensitive(r#"{"id":1,"Id":2,"NAME":"a","name":"b"}"#)?;
        assert_eq!(product.id, 2);
        assert_eq!(product.name.as_deref(), Some("b"));

        let product = Product::from_json_case_insensitive(r#"{"Id":2,"id":1}"#)?;
        assert_eq!(product.id, 1);
        Ok(())
    }

    #[test]
    fn decode_rejects_null() {
        let result = Product::from_json_case_insensitive("null");
        assert!(matches!(result, Err(ProductDecodeError::Null)));
    }

    #[test]
    fn decode_rejects_non_objects() {
        let result = Product::from_json_case_insensitive(r#"[1, "Mug", 9.99, null]"#);
        assert!(matches!(
            result,
            Err(ProductDecodeError::NotAnObject { found: "array" })
        ));

        let result = Product::from_json_case_insensitive("42");
        assert!(matches!(
            result,
            Err(ProductDecodeError::NotAnObject { found: "number" })
        ));
    }

    #[test]
    fn decode_rejects_wrong_field_types() {
        let result = Product::from_json_case_insensitive(r#"{"Id":"one"}"#);
        assert!(matches!(result, Err(ProductDecodeError::Invalid(_))));

        let result = Product::from_json_case_insensitive(r#"{"Price":"9.99"}"#);
        assert!(matches!(result, Err(ProductDecodeError::Invalid(_))));

        let result = Product::from_json_case_insensitive(r#"{"Price":null}"#);
        assert!(matches!(result, Err(ProductDecodeError::Invalid(_))));
    }

    #[test]
    fn high_precision_price_is_exact() -> anyhow::Result<()> {
        let product = Product::from_json_case_insensitive(
            r#"{"Id":1,"Name":"x","Price":12345678901234567.89}"#,
        )?;
        assert_eq!(product.price, price("12345678901234567.89"));

        let json = product.to_pretty_json()?;
        assert!(json.contains("\"Price\": 12345678901234567.89"));
        assert_eq!(Product::from_json_case_insensitive(&json)?, product);
        Ok(())
    }

    #[test]
    fn encode_keeps_non_ascii_verbatim() -> anyhow::Result<()> {
        let json = Product::new(1, "Café Mug", price("9.99"))
            .with_description("Ceramic")
            .to_pretty_json()?;

        assert!(json.contains("\"Name\": \"Café Mug\""));
        assert!(json.contains("\"Price\": 9.99"));
        assert!(json.contains('\n'));
        assert!(!json.contains("\\u"));
        Ok(())
    }

    #[test]
    fn encode_then_decode_is_identity() -> anyhow::Result<()> {
        let product =
            Product::new(42, "Crème brûlée dish €", price("12.75")).with_description("Oven-safe");
        let decoded = Product::from_json_case_insensitive(&product.to_pretty_json()?)?;

        assert_eq!(decoded, product);
        Ok(())
    }
}
