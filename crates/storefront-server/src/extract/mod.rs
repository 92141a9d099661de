//! Request extractors with JSON error responses.
//!
//! - [`Json`] - JSON deserialization whose rejections render as
//!   [`ErrorResponse`](crate::handler::response::ErrorResponse) bodies.

mod json;

pub use self::json::Json;
