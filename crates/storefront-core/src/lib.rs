#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for in-memory capability implementations.
pub const TRACING_TARGET_MEMORY: &str = "storefront_core::memory";

/// Tracing target for domain type conversions.
///
/// Use this target for logging decode and encode decisions on products and profiles.
pub const TRACING_TARGET_TYPES: &str = "storefront_core::types";

mod error;
pub mod memory;
pub mod queue;
pub mod store;
pub mod types;

#[doc(hidden)]
pub mod prelude;

pub use error::{BoxedError, Error, ErrorKind, Result};
