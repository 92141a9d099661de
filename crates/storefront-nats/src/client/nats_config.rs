//! NATS connection configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Configuration for NATS connections with sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct NatsConfig {
    /// NATS server URL (comma-separated for clustering)
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-url", env = "NATS_URL", default_value = DEFAULT_URL)
    )]
    pub nats_url: String,

    /// Authentication token
    #[cfg_attr(feature = "config", arg(long = "nats-token", env = "NATS_TOKEN"))]
    pub nats_token: Option<String>,

    /// Client connection name for debugging and monitoring
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-client-name", env = "NATS_CLIENT_NAME")
    )]
    pub nats_client_name: Option<String>,

    /// Connection timeout in seconds (optional)
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-connect-timeout", env = "NATS_CONNECT_TIMEOUT_SECS")
    )]
    pub nats_connect_timeout: Option<u64>,

    /// Maximum number of reconnection attempts (0 = unlimited)
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-max-reconnects", env = "NATS_MAX_RECONNECTS")
    )]
    pub nats_max_reconnects: Option<usize>,

    /// Seconds a leased queue message stays invisible before redelivery
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-ack-wait", env = "NATS_ACK_WAIT_SECS")
    )]
    pub nats_ack_wait: Option<u64>,

    /// Milliseconds a queue fetch waits for a message before returning empty
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-fetch-timeout-ms", env = "NATS_FETCH_TIMEOUT_MS")
    )]
    pub nats_fetch_timeout_ms: Option<u64>,
}

// Default values
const DEFAULT_URL: &str = "nats://127.0.0.1:4222";
const DEFAULT_NAME: &str = "storefront";
const DEFAULT_MAX_RECONNECTS: usize = 10;
const DEFAULT_RECONNECT_DELAY_SECS: u64 = 2;
const DEFAULT_PING_INTERVAL_SECS: u64 = 30;
const DEFAULT_ACK_WAIT_SECS: u64 = 300;
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 1_000;

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            nats_url: DEFAULT_URL.to_owned(),
            nats_token: None,
            nats_client_name: None,
            nats_connect_timeout: None,
            nats_max_reconnects: None,
            nats_ack_wait: None,
            nats_fetch_timeout_ms: None,
        }
    }
}

impl NatsConfig {
    /// Create a new configuration with a single server URL and token.
    pub fn new(server_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            nats_url: server_url.into(),
            nats_token: Some(token.into()),
            ..Self::default()
        }
    }

    /// Returns the client name, using the default if not set.
    #[inline]
    pub fn name(&self) -> &str {
        self.nats_client_name.as_deref().unwrap_or(DEFAULT_NAME)
    }

    /// Returns the server URLs as a vector (splits comma-separated URLs).
    pub fn servers(&self) -> Vec<&str> {
        self.nats_url.split(',').map(str::trim).collect()
    }

    /// Returns the connection timeout as a Duration, if set.
    #[inline]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.nats_connect_timeout.map(Duration::from_secs)
    }

    /// Returns the reconnect delay as a Duration.
    #[inline]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(DEFAULT_RECONNECT_DELAY_SECS)
    }

    /// Returns the ping interval as a Duration.
    #[inline]
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(DEFAULT_PING_INTERVAL_SECS)
    }

    /// Returns the max reconnects as Option (0 means unlimited).
    #[inline]
    pub fn max_reconnects_option(&self) -> Option<usize> {
        let max = self.nats_max_reconnects.unwrap_or(DEFAULT_MAX_RECONNECTS);
        if max == 0 { None } else { Some(max) }
    }

    /// Returns how long a leased message stays invisible to other consumers.
    #[inline]
    pub fn ack_wait(&self) -> Duration {
        Duration::from_secs(self.nats_ack_wait.unwrap_or(DEFAULT_ACK_WAIT_SECS))
    }

    /// Returns how long a single fetch waits for a message.
    #[inline]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.nats_fetch_timeout_ms.unwrap_or(DEFAULT_FETCH_TIMEOUT_MS))
    }

    /// Set server URL(s).
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.nats_url = url.into();
        self
    }

    /// Set the client connection name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.nats_client_name = Some(name.into());
        self
    }

    /// Set the connection timeout in seconds.
    #[must_use]
    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.nats_connect_timeout = Some(secs);
        self
    }

    /// Set maximum reconnection attempts (0 for unlimited).
    #[must_use]
    pub fn with_max_reconnects(mut self, max_reconnects: usize) -> Self {
        self.nats_max_reconnects = Some(max_reconnects);
        self
    }

    /// Set the ack wait in seconds.
    #[must_use]
    pub fn with_ack_wait_secs(mut self, secs: u64) -> Self {
        self.nats_ack_wait = Some(secs);
        self
    }

    /// Validate the configuration and return any issues.
    pub fn validate(&self) -> Result<(), String> {
        for server in self.servers() {
            if server.is_empty() {
                return Err("Server URL cannot be empty".to_string());
            }
            if !server.starts_with("nats://") && !server.starts_with("tls://") {
                return Err(format!("Invalid server URL format: {}", server));
            }
        }

        if self.nats_token.as_deref().is_some_and(str::is_empty) {
            return Err("Token cannot be empty when provided".to_string());
        }

        if self.nats_ack_wait == Some(0) {
            return Err("Ack wait must be at least one second".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config() {
        let config = NatsConfig::new("nats://localhost:4222", "my-token");
        assert_eq!(config.servers(), vec!["nats://localhost:4222"]);
        assert_eq!(config.nats_token.as_deref(), Some("my-token"));
        assert_eq!(config.name(), "storefront");
        assert_eq!(config.connect_timeout(), None);
        assert_eq!(config.max_reconnects_option(), Some(10));
    }

    #[test]
    fn test_default_values() {
        let config = NatsConfig::default();
        assert_eq!(config.servers(), vec![DEFAULT_URL]);
        assert!(config.nats_token.is_none());
        assert_eq!(config.ack_wait(), Duration::from_secs(DEFAULT_ACK_WAIT_SECS));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(1));
        assert_eq!(config.reconnect_delay(), Duration::from_secs(2));
        assert_eq!(config.ping_interval(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = NatsConfig::default()
            .with_url("nats://a:4222, nats://b:4222")
            .with_name("cart-worker")
            .with_connect_timeout_secs(5)
            .with_max_reconnects(0)
            .with_ack_wait_secs(60);

        assert_eq!(config.servers(), vec!["nats://a:4222", "nats://b:4222"]);
        assert_eq!(config.name(), "cart-worker");
        assert_eq!(config.connect_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.max_reconnects_option(), None);
        assert_eq!(config.ack_wait(), Duration::from_secs(60));
    }

    #[test]
    fn test_config_validation() {
        assert!(NatsConfig::new("nats://localhost:4222", "t").validate().is_ok());
        assert!(NatsConfig::new("", "t").validate().is_err());
        assert!(NatsConfig::new("http://localhost", "t").validate().is_err());
        assert!(NatsConfig::new("nats://localhost:4222", "").validate().is_err());
        assert!(NatsConfig::default().with_ack_wait_secs(0).validate().is_err());
    }
}
