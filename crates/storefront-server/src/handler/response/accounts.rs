//! Account response types.

use serde::{Deserialize, Serialize};

/// Plain acknowledgement returned by account endpoints.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

impl MessageResponse {
    /// Returned by `POST /register` after the profile is stored.
    pub fn registered() -> Self {
        Self::new("User registered successfully.")
    }

    /// Returned by `POST /login` after the password is verified.
    pub fn logged_in() -> Self {
        Self::new("Logged in successfully")
    }

    fn new(message: &str) -> Self {
        Self {
            message: message.to_owned(),
        }
    }
}
