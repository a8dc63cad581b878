//! Configuration management for the booking service.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;

/// Share links point here unless `BUSFLOW_SHARE_BASE_URL` is set
pub const DEFAULT_SHARE_BASE_URL: &str = "https://busflow.example/pay";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Booking flow settings
    pub booking: BookingConfig,
    /// Share-link settings
    pub share: ShareConfig,
    /// Operator notification settings
    pub notifier: NotifierConfig,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
}

/// Booking flow configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Simulated search latency in milliseconds (default: 800)
    pub search_delay_ms: u64,
    /// Seed for reproducible availability and codes
    pub seed: Option<u64>,
}

/// Share-link configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Base URL of generated links
    pub base_url: String,
}

/// Notifier configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Chat bot endpoint; notifications are only logged when unset
    pub endpoint: Option<String>,
    /// Target chat
    pub chat_id: String,
    /// Request timeout in seconds (default: 10)
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unparseable numbers fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            booking: BookingConfig {
                search_delay_ms: lookup("BUSFLOW_SEARCH_DELAY_MS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(800),
                seed: lookup("BUSFLOW_SEED").and_then(|v| v.parse().ok()),
            },
            share: ShareConfig {
                base_url: lookup("BUSFLOW_SHARE_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_SHARE_BASE_URL.to_string()),
            },
            notifier: NotifierConfig {
                endpoint: lookup("BUSFLOW_NOTIFY_URL").filter(|v| !v.trim().is_empty()),
                chat_id: lookup("BUSFLOW_NOTIFY_CHAT_ID").unwrap_or_default(),
                timeout_secs: lookup("BUSFLOW_NOTIFY_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            },
            log_level: lookup("RUST_LOG").unwrap_or_else(|| {
                "busflow=debug,busflow_booking=debug,busflow_runtime=info".to_string()
            }),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_without_variables() {
        let config = Config::default();
        assert_eq!(config.booking.search_delay_ms, 800);
        assert_eq!(config.booking.seed, None);
        assert_eq!(config.share.base_url, DEFAULT_SHARE_BASE_URL);
        assert_eq!(config.notifier.endpoint, None);
        assert_eq!(config.notifier.timeout_secs, 10);
    }

    #[test]
    fn variables_override_defaults() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("BUSFLOW_SEARCH_DELAY_MS", "0"),
            ("BUSFLOW_SEED", "42"),
            ("BUSFLOW_SHARE_BASE_URL", "https://pay.example"),
            ("BUSFLOW_NOTIFY_URL", "https://bot.example/send"),
            ("BUSFLOW_NOTIFY_CHAT_ID", "-100"),
            ("BUSFLOW_NOTIFY_TIMEOUT_SECS", "not-a-number"),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(ToString::to_string));

        assert_eq!(config.booking.search_delay_ms, 0);
        assert_eq!(config.booking.seed, Some(42));
        assert_eq!(config.share.base_url, "https://pay.example");
        assert_eq!(config.notifier.endpoint.as_deref(), Some("https://bot.example/send"));
        assert_eq!(config.notifier.chat_id, "-100");
        assert_eq!(config.notifier.timeout_secs, 10);
    }

    #[test]
    fn blank_endpoint_means_unset() {
        let config = Config::from_lookup(|key| (key == "BUSFLOW_NOTIFY_URL").then(|| "  ".to_string()));
        assert_eq!(config.notifier.endpoint, None);
    }
}
