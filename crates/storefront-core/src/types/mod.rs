//! Domain types carried through queues and stores.

mod artifact_headers;
mod artifact_key;
mod customer;
mod product;

pub use bigdecimal::BigDecimal;

pub use artifact_headers::{ArtifactHeaders, CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE};
pub use artifact_key::{ARTIFACT_KEY_PREFIX, ARTIFACT_KEY_SUFFIX, ArtifactKey};
pub use customer::{CUSTOMER_PARTITION, CustomerProfile, LoginRecord};
pub use product::{Product, ProductDecodeError};
