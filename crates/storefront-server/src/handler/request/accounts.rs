//! Account request types.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Loose `local@domain.tld` shape check; deliverability is not verified.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("invalid email pattern")
});

/// Email and password, as sent to `POST /register` and `POST /login`.
///
/// Field names are `Email` and `Password`; lowercase spellings are accepted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account email address.
    #[serde(rename = "Email", alias = "email")]
    pub email: String,
    /// Plain-text password.
    #[serde(rename = "Password", alias = "password")]
    pub password: String,
}

impl Credentials {
    /// Creates a new credentials pair.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Returns true if the email is well formed and the password is not blank.
    pub fn is_valid(&self) -> bool {
        EMAIL_PATTERN.is_match(&self.email) && !self.password.trim().is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_pascal_and_lower_case() -> anyhow::Result<()> {
        let a: Credentials =
            serde_json::from_str(r#"{"Email":"ann@example.com","Password":"s3cret"}"#)?;
        let b: Credentials =
            serde_json::from_str(r#"{"email":"ann@example.com","password":"s3cret"}"#)?;
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn validates_email_shape() {
        assert!(Credentials::new("ann@example.com", "pw").is_valid());
        assert!(!Credentials::new("ann.example.com", "pw").is_valid());
        assert!(!Credentials::new("ann@example", "pw").is_valid());
        assert!(!Credentials::new("ann @example.com", "pw").is_valid());
        assert!(!Credentials::new("", "pw").is_valid());
    }

    #[test]
    fn rejects_blank_password() {
        assert!(!Credentials::new("ann@example.com", "").is_valid());
        assert!(!Credentials::new("ann@example.com", "   ").is_valid());
    }

    #[test]
    fn debug_redacts_password() {
        let debug = format!("{:?}", Credentials::new("ann@example.com", "s3cret"));
        assert!(!debug.contains("s3cret"));
    }
}
