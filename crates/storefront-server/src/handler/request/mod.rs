//! Request types for HTTP handlers.

mod accounts;

pub use accounts::*;
