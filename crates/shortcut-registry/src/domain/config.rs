//! Registry configuration types.
//!
//! [`RegistryConfig`] is the single source of truth for runtime settings.  It
//! is a plain struct so tests can build one inline; the infrastructure layer
//! is responsible for reading it from a TOML file.
//!
//! ```toml
//! [bridge]
//! url = "ws://127.0.0.1:8000/shortcut-bridge"
//! connect_timeout_ms = 5000
//!
//! [registry]
//! query_timeout_ms = 2000   # omit to wait for the host indefinitely
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every field has a serde default, so an empty file (or a file from an older
//! version missing newer fields) still loads.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RegistryConfig {
    #[serde(default)]
    pub bridge: BridgeSection,
    #[serde(default)]
    pub registry: RegistrySection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Where and how to reach the host process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeSection {
    /// WebSocket URL of the host's bridge endpoint.
    #[serde(default = "default_bridge_url")]
    pub url: String,
    /// Maximum time allowed for the WebSocket handshake.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

/// Behaviour of the registry itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RegistrySection {
    /// Default deadline applied to every `is_registered` query.
    ///
    /// `None` (the default) waits for the host's answer indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_timeout_ms: Option<u64>,
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSection {
    /// `tracing` level filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_bridge_url() -> String {
    "ws://127.0.0.1:8000/shortcut-bridge".to_string()
}
fn default_connect_timeout_ms() -> u64 {
    5_000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            url: default_bridge_url(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl RegistryConfig {
    /// Returns the WebSocket handshake timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.bridge.connect_timeout_ms)
    }

    /// Returns the default query deadline, if one is configured.
    pub fn query_timeout(&self) -> Option<Duration> {
        self.registry.query_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_query_timeout() {
        // Waiting indefinitely is the default; a deadline is opt-in.
        let cfg = RegistryConfig::default();
        assert_eq!(cfg.query_timeout(), None);
    }

    #[test]
    fn test_default_connect_timeout_is_5s() {
        let cfg = RegistryConfig::default();
        assert_eq!(cfg.connect_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_default_bridge_url_is_loopback_websocket() {
        let cfg = RegistryConfig::default();
        assert!(cfg.bridge.url.starts_with("ws://127.0.0.1:"));
    }

    #[test]
    fn test_default_log_level_is_info() {
        assert_eq!(RegistryConfig::default().logging.level, "info");
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let cfg: RegistryConfig = toml::from_str("").expect("empty config parses");
        assert_eq!(cfg, RegistryConfig::default());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        // Arrange
        let text = "[registry]\nquery_timeout_ms = 250\n";

        // Act
        let cfg: RegistryConfig = toml::from_str(text).expect("partial config parses");

        // Assert
        assert_eq!(cfg.query_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(cfg.bridge, BridgeSection::default());
        assert_eq!(cfg.logging.level, "info");
    }
}
