//! Response types for HTTP handlers.

mod accounts;
mod carts;
mod error_response;
mod monitors;

pub use accounts::*;
pub use carts::*;
pub use error_response::ErrorResponse;
pub use monitors::*;
