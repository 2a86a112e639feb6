//! Bus event translation
//!
//! Raw events from the network service arrive as an owner name, a numeric
//! event class and a JSON payload. The translator decodes them into one of
//! four [`Notification`]s, renaming platform interface tokens to their kind
//! and applying the configured suppression policy.
//!
//! Malformed events (wrong owner, unknown class, empty or undecodable
//! payload) are logged and dropped; they never reach a subscriber.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::EventPolicy;
use crate::error::{Error, Result};
use crate::traits::{EventClass, InterfaceCatalog, LinkLocalCheck, NETWORK_SERVICE_OWNER};

/// Notification emitted to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    InterfaceStatusChanged(InterfaceStatusChange),
    ConnectionStatusChanged(ConnectionStatusChange),
    IpAddressStatusChanged(IpAddressStatusChange),
    DefaultInterfaceChanged(DefaultInterfaceChange),
}

impl Notification {
    /// Notification method name
    pub fn method(&self) -> &'static str {
        match self {
            Notification::InterfaceStatusChanged(_) => "onInterfaceStatusChanged",
            Notification::ConnectionStatusChanged(_) => "onConnectionStatusChanged",
            Notification::IpAddressStatusChanged(_) => "onIPAddressStatusChanged",
            Notification::DefaultInterfaceChanged(_) => "onDefaultInterfaceChanged",
        }
    }

    /// Notification parameters as sent to subscribers
    pub fn params(&self) -> serde_json::Value {
        let params = match self {
            Notification::InterfaceStatusChanged(p) => serde_json::to_value(p),
            Notification::ConnectionStatusChanged(p) => serde_json::to_value(p),
            Notification::IpAddressStatusChanged(p) => serde_json::to_value(p),
            Notification::DefaultInterfaceChanged(p) => serde_json::to_value(p),
        };
        // Plain structs of strings and booleans always serialize
        params.unwrap_or_default()
    }
}

/// `onInterfaceStatusChanged` parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceStatusChange {
    pub interface: String,
    pub enabled: bool,
}

/// `onConnectionStatusChanged` parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatusChange {
    pub interface: String,
    pub status: ConnectionStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// `onIPAddressStatusChanged` parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpAddressStatusChange {
    pub interface: String,
    #[serde(rename = "ip6Address", skip_serializing_if = "Option::is_none")]
    pub ip6_address: Option<String>,
    #[serde(rename = "ip4Address", skip_serializing_if = "Option::is_none")]
    pub ip4_address: Option<String>,
    pub status: AddressStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AddressStatus {
    Acquired,
    Lost,
}

/// `onDefaultInterfaceChanged` parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultInterfaceChange {
    pub old_interface_name: String,
    pub new_interface_name: String,
}

/// Raw enabled/connection status payload
#[derive(Debug, Deserialize)]
struct StatusEvent {
    interface: String,
    status: bool,
}

/// Raw address payload
#[derive(Debug, Deserialize)]
struct IpAddressEvent {
    interface: String,
    ip_address: String,
    is_ipv6: bool,
    acquired: bool,
}

/// Raw default interface payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefaultInterfaceEvent {
    old_interface: String,
    new_interface: String,
}

/// Raw bus event to notification translator
pub struct EventTranslator {
    catalog: Arc<dyn InterfaceCatalog>,
    link_local: Arc<dyn LinkLocalCheck>,
    policy: EventPolicy,
}

impl EventTranslator {
    /// Create a translator
    pub fn new(
        catalog: Arc<dyn InterfaceCatalog>,
        link_local: Arc<dyn LinkLocalCheck>,
        policy: EventPolicy,
    ) -> Self {
        Self {
            catalog,
            link_local,
            policy,
        }
    }

    /// Translate one raw event
    ///
    /// # Returns
    ///
    /// - `Some(Notification)`: to be delivered to subscribers
    /// - `None`: suppressed by policy or dropped as malformed
    pub fn translate(&self, owner: &str, event_id: u32, payload: &[u8]) -> Option<Notification> {
        match self.try_translate(owner, event_id, payload) {
            Ok(notification) => notification,
            Err(e) => {
                error!("Dropping event {} from {}: {}", event_id, owner, e);
                None
            }
        }
    }

    fn try_translate(
        &self,
        owner: &str,
        event_id: u32,
        payload: &[u8],
    ) -> Result<Option<Notification>> {
        if owner != NETWORK_SERVICE_OWNER {
            return Err(Error::unknown_event(format!("unexpected owner {}", owner)));
        }
        if payload.is_empty() {
            return Err(Error::unknown_event("event with no data"));
        }

        let class = EventClass::from_id(event_id)
            .ok_or_else(|| Error::unknown_event(format!("unhandled event id {}", event_id)))?;

        let notification = match class {
            EventClass::InterfaceEnabledStatus => {
                let event: StatusEvent = decode(payload)?;
                self.describe_defined(&event.interface).map(|interface| {
                    Notification::InterfaceStatusChanged(InterfaceStatusChange {
                        interface,
                        enabled: event.status,
                    })
                })
            }
            EventClass::InterfaceConnectionStatus => {
                let event: StatusEvent = decode(payload)?;
                self.describe_defined(&event.interface).map(|interface| {
                    let status = if event.status {
                        ConnectionStatus::Connected
                    } else {
                        ConnectionStatus::Disconnected
                    };
                    Notification::ConnectionStatusChanged(ConnectionStatusChange {
                        interface,
                        status,
                    })
                })
            }
            EventClass::InterfaceIpAddress => {
                let event: IpAddressEvent = decode(payload)?;
                self.translate_address(event)
            }
            EventClass::DefaultInterface => {
                let event: DefaultInterfaceEvent = decode(payload)?;
                Some(Notification::DefaultInterfaceChanged(DefaultInterfaceChange {
                    old_interface_name: self.catalog.describe(&event.old_interface),
                    new_interface_name: self.catalog.describe(&event.new_interface),
                }))
            }
        };

        if notification.is_none() {
            debug!("Event {:?} suppressed by policy", class);
        }

        Ok(notification)
    }

    fn translate_address(&self, event: IpAddressEvent) -> Option<Notification> {
        let interface = self.describe_defined(&event.interface)?;

        if self.policy.no_link_local_announce {
            let link_local = if event.is_ipv6 {
                self.link_local.is_ipv6_link_local(&event.ip_address)
            } else {
                self.link_local.is_ipv4_link_local(&event.ip_address)
            };
            if link_local {
                return None;
            }
        }

        let address = (!event.ip_address.is_empty()).then_some(event.ip_address);
        let (ip6_address, ip4_address) = if event.is_ipv6 {
            (address, None)
        } else {
            (None, address)
        };

        Some(Notification::IpAddressStatusChanged(IpAddressStatusChange {
            interface,
            ip6_address,
            ip4_address,
            status: if event.acquired {
                AddressStatus::Acquired
            } else {
                AddressStatus::Lost
            },
        }))
    }

    /// Interface description, or `None` when unknown interfaces are filtered
    fn describe_defined(&self, token: &str) -> Option<String> {
        let description = self.catalog.describe(token);
        if description.is_empty() && self.policy.defined_interfaces_only {
            return None;
        }
        Some(description)
    }
}

fn decode<'a, T: Deserialize<'a>>(payload: &'a [u8]) -> Result<T> {
    serde_json::from_slice(payload).map_err(|e| Error::unknown_event(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netutils::{StaticInterfaceCatalog, StdLinkLocal};
    use serde_json::json;

    fn translator(policy: EventPolicy) -> EventTranslator {
        EventTranslator::new(
            Arc::new(StaticInterfaceCatalog::default()),
            Arc::new(StdLinkLocal),
            policy,
        )
    }

    fn bytes(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    const ENABLED: u32 = 53;
    const CONNECTION: u32 = 54;
    const ADDRESS: u32 = 55;
    const DEFAULT: u32 = 56;

    #[test]
    fn enabled_status_is_translated() {
        let payload = bytes(json!({ "interface": "eth0", "status": true }));
        let notification = translator(EventPolicy::default())
            .translate(NETWORK_SERVICE_OWNER, ENABLED, &payload)
            .unwrap();

        assert_eq!(notification.method(), "onInterfaceStatusChanged");
        assert_eq!(
            notification.params(),
            json!({ "interface": "ETHERNET", "enabled": true })
        );
    }

    #[test]
    fn connection_status_renders_words() {
        let payload = bytes(json!({ "interface": "wlan0", "status": false }));
        let notification = translator(EventPolicy::default())
            .translate(NETWORK_SERVICE_OWNER, CONNECTION, &payload)
            .unwrap();

        assert_eq!(
            notification.params(),
            json!({ "interface": "WIFI", "status": "DISCONNECTED" })
        );
    }

    #[test]
    fn unknown_interface_passes_without_policy() {
        let payload = bytes(json!({ "interface": "moca0", "status": true }));
        let notification = translator(EventPolicy::default())
            .translate(NETWORK_SERVICE_OWNER, ENABLED, &payload)
            .unwrap();

        assert_eq!(notification.params()["interface"], "");
    }

    #[test]
    fn unknown_interface_suppressed_with_policy() {
        let policy = EventPolicy {
            defined_interfaces_only: true,
            ..EventPolicy::default()
        };
        let payload = bytes(json!({ "interface": "moca0", "status": true }));

        assert!(translator(policy)
            .translate(NETWORK_SERVICE_OWNER, CONNECTION, &payload)
            .is_none());
    }

    #[test]
    fn ipv4_address_change() {
        let payload = bytes(json!({
            "interface": "eth0",
            "ip_address": "192.168.1.20",
            "is_ipv6": false,
            "acquired": true,
        }));
        let notification = translator(EventPolicy::default())
            .translate(NETWORK_SERVICE_OWNER, ADDRESS, &payload)
            .unwrap();

        assert_eq!(notification.method(), "onIPAddressStatusChanged");
        assert_eq!(
            notification.params(),
            json!({ "interface": "ETHERNET", "ip4Address": "192.168.1.20", "status": "ACQUIRED" })
        );
    }

    #[test]
    fn ipv6_address_lost() {
        let payload = bytes(json!({
            "interface": "wlan0",
            "ip_address": "2001:db8::5",
            "is_ipv6": true,
            "acquired": false,
        }));
        let notification = translator(EventPolicy::default())
            .translate(NETWORK_SERVICE_OWNER, ADDRESS, &payload)
            .unwrap();

        assert_eq!(
            notification.params(),
            json!({ "interface": "WIFI", "ip6Address": "2001:db8::5", "status": "LOST" })
        );
    }

    #[test]
    fn empty_address_is_omitted() {
        let payload = bytes(json!({
            "interface": "eth0",
            "ip_address": "",
            "is_ipv6": false,
            "acquired": false,
        }));
        let notification = translator(EventPolicy::default())
            .translate(NETWORK_SERVICE_OWNER, ADDRESS, &payload)
            .unwrap();

        assert_eq!(
            notification.params(),
            json!({ "interface": "ETHERNET", "status": "LOST" })
        );
    }

    #[test]
    fn default_interface_change_is_never_suppressed() {
        let policy = EventPolicy {
            defined_interfaces_only: true,
            no_link_local_announce: true,
        };
        let payload = bytes(json!({ "oldInterface": "eth0", "newInterface": "moca0" }));
        let notification = translator(policy)
            .translate(NETWORK_SERVICE_OWNER, DEFAULT, &payload)
            .unwrap();

        assert_eq!(
            notification.params(),
            json!({ "oldInterfaceName": "ETHERNET", "newInterfaceName": "" })
        );
    }

    #[test]
    fn malformed_events_are_dropped() {
        let t = translator(EventPolicy::default());
        let payload = bytes(json!({ "interface": "eth0", "status": true }));

        assert!(t.translate("SOME_OTHER_OWNER", ENABLED, &payload).is_none());
        assert!(t.translate(NETWORK_SERVICE_OWNER, ENABLED, &[]).is_none());
        assert!(t.translate(NETWORK_SERVICE_OWNER, 50, &payload).is_none());
        assert!(t.translate(NETWORK_SERVICE_OWNER, ENABLED, b"{not json").is_none());
        assert!(t.translate(NETWORK_SERVICE_OWNER, DEFAULT, &payload).is_none());
    }
}
