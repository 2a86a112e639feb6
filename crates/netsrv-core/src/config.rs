//! Configuration types for the network facade
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::traits::InterfaceKind;

/// Maximum STUN server host name length (exclusive)
pub const MAX_STUN_SERVER_LEN: usize = 128;

/// Main facade configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Default-route resolution strategy
    #[serde(default)]
    pub device_mode: DeviceMode,

    /// Event and listing filters
    #[serde(default)]
    pub policy: EventPolicy,

    /// Availability probe settings
    #[serde(default)]
    pub availability: AvailabilityConfig,

    /// Timeout applied to every data call on the bus (in milliseconds)
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,

    /// Platform interface token -> kind table for the default catalog
    #[serde(default = "default_interfaces")]
    pub interfaces: HashMap<String, InterfaceKind>,

    /// Default STUN endpoint for public address lookups
    #[serde(default)]
    pub stun: StunConfig,

    /// Capacity of the notification channel
    ///
    /// When full, new notifications are dropped (with a warning log).
    #[serde(default = "default_notification_channel_capacity")]
    pub notification_channel_capacity: usize,
}

impl NetworkConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            device_mode: DeviceMode::default(),
            policy: EventPolicy::default(),
            availability: AvailabilityConfig::default(),
            call_timeout_ms: default_call_timeout_ms(),
            interfaces: default_interfaces(),
            stun: StunConfig::default(),
            notification_channel_capacity: default_notification_channel_capacity(),
        }
    }

    /// Set the device mode
    pub fn with_device_mode(mut self, device_mode: DeviceMode) -> Self {
        self.device_mode = device_mode;
        self
    }

    /// Set the event policy
    pub fn with_policy(mut self, policy: EventPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Timeout for bus data calls
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.call_timeout_ms == 0 {
            return Err(crate::Error::config("call_timeout_ms must be > 0"));
        }

        if self.notification_channel_capacity == 0 {
            return Err(crate::Error::config(
                "notification_channel_capacity must be > 0",
            ));
        }

        self.availability.validate()?;
        self.stun.validate()?;

        Ok(())
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Which default-route strategy applies; constant for the process lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceMode {
    /// Route text is parsed locally and memoized
    Hybrid,
    /// The network service is asked for the default route directly
    #[default]
    MediaClient,
}

impl DeviceMode {
    /// Map a platform `DEVICE_TYPE` value to a mode
    ///
    /// Only the exact value "hybrid" selects the parsed strategy.
    pub fn from_device_type(device_type: &str) -> Self {
        if device_type == "hybrid" {
            DeviceMode::Hybrid
        } else {
            DeviceMode::MediaClient
        }
    }
}

/// Filters applied to notifications and interface listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPolicy {
    /// Drop events and listing entries for interfaces the catalog does not know
    #[serde(default)]
    pub defined_interfaces_only: bool,

    /// Drop address events for link-local addresses
    #[serde(default)]
    pub no_link_local_announce: bool,
}

/// Availability probe settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityConfig {
    /// Timeout of a single availability probe (in milliseconds)
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Delay between failed probes (in milliseconds)
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// Probes attempted synchronously during initialization before handing
    /// off to the background monitor
    #[serde(default = "default_startup_probe_attempts")]
    pub startup_probe_attempts: u32,
}

impl AvailabilityConfig {
    /// Probe timeout as a duration
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Retry interval as a duration
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    /// Validate the availability settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.probe_timeout_ms == 0 {
            return Err(crate::Error::config("probe_timeout_ms must be > 0"));
        }
        if self.retry_interval_ms == 0 {
            return Err(crate::Error::config("retry_interval_ms must be > 0"));
        }
        if self.startup_probe_attempts == 0 {
            return Err(crate::Error::config("startup_probe_attempts must be >= 1"));
        }
        Ok(())
    }
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: default_probe_timeout_ms(),
            retry_interval_ms: default_retry_interval_ms(),
            startup_probe_attempts: default_startup_probe_attempts(),
        }
    }
}

/// STUN endpoint used by public address lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StunConfig {
    #[serde(default = "default_stun_server")]
    pub server: String,

    #[serde(default = "default_stun_port")]
    pub port: u16,

    /// Bind timeout (in seconds)
    #[serde(default = "default_stun_bind_timeout", alias = "timeout")]
    pub bind_timeout: u16,

    /// Result cache lifetime (in seconds, 0 disables caching)
    #[serde(default)]
    pub cache_timeout: u16,

    #[serde(default = "default_stun_sync")]
    pub sync: bool,
}

impl StunConfig {
    /// Validate the STUN endpoint
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.server.len() >= MAX_STUN_SERVER_LEN {
            return Err(crate::Error::config(format!(
                "STUN server exceeds max length of {}",
                MAX_STUN_SERVER_LEN
            )));
        }
        Ok(())
    }
}

impl Default for StunConfig {
    fn default() -> Self {
        Self {
            server: default_stun_server(),
            port: default_stun_port(),
            bind_timeout: default_stun_bind_timeout(),
            cache_timeout: 0,
            sync: default_stun_sync(),
        }
    }
}

pub(crate) fn default_interfaces() -> HashMap<String, InterfaceKind> {
    HashMap::from([
        ("eth0".to_string(), InterfaceKind::Ethernet),
        ("wlan0".to_string(), InterfaceKind::Wifi),
    ])
}

fn default_call_timeout_ms() -> u64 {
    10_000
}

fn default_notification_channel_capacity() -> usize {
    1000
}

fn default_probe_timeout_ms() -> u64 {
    10_000
}

fn default_retry_interval_ms() -> u64 {
    500
}

fn default_startup_probe_attempts() -> u32 {
    1
}

fn default_stun_server() -> String {
    "stun.l.google.com".to_string()
}

fn default_stun_port() -> u16 {
    19302
}

fn default_stun_bind_timeout() -> u16 {
    30
}

fn default_stun_sync() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_document_uses_defaults() {
        let config: NetworkConfig = serde_json::from_value(json!({})).unwrap();

        assert_eq!(config.device_mode, DeviceMode::MediaClient);
        assert_eq!(config.availability.retry_interval_ms, 500);
        assert_eq!(config.stun.server, "stun.l.google.com");
        assert_eq!(config.stun.port, 19302);
        assert_eq!(config.interfaces.get("wlan0"), Some(&InterfaceKind::Wifi));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_overrides() {
        let config: NetworkConfig = serde_json::from_value(json!({
            "device_mode": "hybrid",
            "policy": { "defined_interfaces_only": true },
            "interfaces": { "eth1": "ETHERNET" },
        }))
        .unwrap();

        assert_eq!(config.device_mode, DeviceMode::Hybrid);
        assert!(config.policy.defined_interfaces_only);
        assert!(!config.policy.no_link_local_announce);
        assert_eq!(config.interfaces.len(), 1);
    }

    #[test]
    fn rejects_zero_intervals() {
        let mut config = NetworkConfig::new();
        config.availability.retry_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = NetworkConfig::new();
        config.call_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_long_stun_server() {
        let mut config = NetworkConfig::new();
        config.stun.server = "s".repeat(MAX_STUN_SERVER_LEN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn stun_endpoint_parameters() {
        let stun: StunConfig = serde_json::from_value(json!({
            "server": "stun.example.net",
            "port": 3478,
            "timeout": 10,
        }))
        .unwrap();

        assert_eq!(stun.bind_timeout, 10);
        assert_eq!(stun.cache_timeout, 0);
        assert!(stun.sync);
    }

    #[test]
    fn device_type_mapping() {
        assert_eq!(DeviceMode::from_device_type("hybrid"), DeviceMode::Hybrid);
        assert_eq!(DeviceMode::from_device_type("mediaclient"), DeviceMode::MediaClient);
        assert_eq!(DeviceMode::from_device_type(""), DeviceMode::MediaClient);
    }
}
