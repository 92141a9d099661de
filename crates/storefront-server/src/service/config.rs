#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default values for configuration options.
mod defaults {
    /// Blob container holding cart artifacts.
    pub const CART_CONTAINER: &str = "cart";

    /// Queue carrying cart items to the ingestion pipeline.
    pub const CART_QUEUE: &str = "cartqueue";

    /// Table holding customer profiles.
    pub const PROFILE_TABLE: &str = "CustomerProfiles";

    /// Share holding login reports and notes.
    pub const LOGIN_SHARE: &str = "logreport";

    /// Append-only report file inside the login share.
    pub const LOGIN_REPORT_FILE: &str = "login-report.txt";

    /// Cache lifetime of stored cart artifacts, in seconds.
    pub const CACHE_MAX_AGE_SECS: u64 = 30;
}

/// Names and policies shared by the HTTP handlers and the ingestion pipeline.
///
/// Used by [`ServiceState`](crate::service::ServiceState).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct ServiceConfig {
    /// Blob container for cart artifacts
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CART_CONTAINER", default_value = defaults::CART_CONTAINER)
    )]
    pub cart_container: String,

    /// Queue feeding the cart ingestion pipeline
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CART_QUEUE", default_value = defaults::CART_QUEUE)
    )]
    pub cart_queue: String,

    /// Table for customer profiles
    #[cfg_attr(
        feature = "config",
        arg(long, env = "PROFILE_TABLE", default_value = defaults::PROFILE_TABLE)
    )]
    pub profile_table: String,

    /// File share for login reports
    #[cfg_attr(
        feature = "config",
        arg(long, env = "LOGIN_SHARE", default_value = defaults::LOGIN_SHARE)
    )]
    pub login_share: String,

    /// Append-only login report file in the share
    #[cfg_attr(
        feature = "config",
        arg(long, env = "LOGIN_REPORT_FILE", default_value = defaults::LOGIN_REPORT_FILE)
    )]
    pub login_report_file: String,

    /// `max-age` of stored cart artifacts, in seconds
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CART_CACHE_MAX_AGE", default_value_t = defaults::CACHE_MAX_AGE_SECS)
    )]
    pub cache_max_age_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cart_container: defaults::CART_CONTAINER.to_owned(),
            cart_queue: defaults::CART_QUEUE.to_owned(),
            profile_table: defaults::PROFILE_TABLE.to_owned(),
            login_share: defaults::LOGIN_SHARE.to_owned(),
            login_report_file: defaults::LOGIN_REPORT_FILE.to_owned(),
            cache_max_age_secs: defaults::CACHE_MAX_AGE_SECS,
        }
    }
}

impl ServiceConfig {
    /// Validates that every resource name is usable.
    pub fn validate(&self) -> Result<()> {
        let names = [
            ("cart container", &self.cart_container),
            ("cart queue", &self.cart_queue),
            ("profile table", &self.profile_table),
            ("login share", &self.login_share),
            ("login report file", &self.login_report_file),
        ];

        for (label, value) in names {
            if value.trim().is_empty() {
                return Err(Error::config(format!("{label} name cannot be empty")));
            }
            if value.contains(['/', '\\']) {
                return Err(Error::config(format!(
                    "{label} name '{value}' cannot contain path separators"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment_names() {
        let config = ServiceConfig::default();
        assert_eq!(config.cart_container, "cart");
        assert_eq!(config.cart_queue, "cartqueue");
        assert_eq!(config.profile_table, "CustomerProfiles");
        assert_eq!(config.login_share, "logreport");
        assert_eq!(config.login_report_file, "login-report.txt");
        assert_eq!(config.cache_max_age_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn blank_names_are_rejected() {
        let config = ServiceConfig {
            cart_container: " ".to_owned(),
            ..ServiceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn path_separators_are_rejected() {
        let config = ServiceConfig {
            login_report_file: "../login-report.txt".to_owned(),
            ..ServiceConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
