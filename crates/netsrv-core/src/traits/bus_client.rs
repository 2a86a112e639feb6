// # Bus Client Trait
//
// Defines the interface to the external network service reached over the
// platform message bus.
//
// ## Implementations
//
// - Transports live outside this crate; the core only calls the trait.
// - Tests use in-process fakes (see `tests/common`).
//
// ## Usage
//
// ```rust,ignore
// use netsrv_core::traits::{BusClient, EventClass};
// use std::time::Duration;
//
// async fn probe(bus: &dyn BusClient) -> netsrv_core::Result<()> {
//     bus.is_available(Duration::from_secs(10)).await?;
//     bus.subscribe(EventClass::DefaultInterface).await
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::settings::{IpSettings, IpSettingsReport};
use crate::traits::InterfaceKind;

/// Bus owner name of the network service; events from any other owner are dropped
pub const NETWORK_SERVICE_OWNER: &str = "NET_SRV_MGR";

/// Event classes published by the network service
///
/// The four classes form one subscription set: they are subscribed and
/// unsubscribed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventClass {
    /// An interface was enabled or disabled
    InterfaceEnabledStatus,
    /// An interface gained or lost carrier
    InterfaceConnectionStatus,
    /// An interface acquired or lost an address
    InterfaceIpAddress,
    /// The default interface moved
    DefaultInterface,
}

impl EventClass {
    /// Every class in the subscription set, in subscription order
    pub const ALL: [EventClass; 4] = [
        EventClass::InterfaceEnabledStatus,
        EventClass::InterfaceConnectionStatus,
        EventClass::InterfaceIpAddress,
        EventClass::DefaultInterface,
    ];

    /// Wire identifier used by the network service
    pub fn id(self) -> u32 {
        match self {
            EventClass::InterfaceEnabledStatus => 53,
            EventClass::InterfaceConnectionStatus => 54,
            EventClass::InterfaceIpAddress => 55,
            EventClass::DefaultInterface => 56,
        }
    }

    /// Map a wire identifier back to a class this crate handles
    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|class| class.id() == id)
    }
}

/// Interface entry as listed by the network service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInterface {
    /// Platform interface token (e.g. "eth0")
    pub name: String,
    /// Hardware address
    pub mac: String,
    /// Kernel interface flags (`IFF_*`)
    pub flags: u32,
}

/// Default route as reported by the service or parsed from route text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultRoute {
    /// Platform interface token carrying the default route
    pub interface: String,
    /// Gateway address
    pub gateway: String,
}

/// Public address lookup request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StunRequest {
    pub server: String,
    pub port: u16,
    pub ipv6: bool,
    pub interface: String,
    pub bind_timeout: u16,
    pub cache_timeout: u16,
    pub sync: bool,
}

/// Trait for the network service bus client
///
/// Every method is a single request/response exchange. Implementations must
/// not retry; the availability probe loop in
/// [`AvailabilityMonitor`](crate::lifecycle::AvailabilityMonitor) is the only
/// retried operation in the system.
///
/// # Thread Safety
///
/// Implementations must be usable from the caller's context and from the
/// monitor's background task.
#[async_trait]
pub trait BusClient: Send + Sync {
    /// Check whether the network service answers within `timeout`
    async fn is_available(&self, timeout: Duration) -> Result<(), crate::Error>;

    /// Register for one event class
    async fn subscribe(&self, class: EventClass) -> Result<(), crate::Error>;

    /// Drop the registration for one event class
    async fn unsubscribe(&self, class: EventClass) -> Result<(), crate::Error>;

    /// List all interfaces known to the service
    async fn interface_list(&self) -> Result<Vec<RawInterface>, crate::Error>;

    /// Query the current default route
    async fn default_route(&self) -> Result<DefaultRoute, crate::Error>;

    /// Move the default route to the interface of the given kind
    async fn set_default_interface(
        &self,
        kind: InterfaceKind,
        persist: bool,
    ) -> Result<(), crate::Error>;

    /// Whether the interface of the given kind is enabled
    async fn is_interface_enabled(&self, kind: InterfaceKind) -> Result<bool, crate::Error>;

    /// Enable or disable the interface of the given kind
    async fn set_interface_enabled(
        &self,
        kind: InterfaceKind,
        enabled: bool,
        persist: bool,
    ) -> Result<(), crate::Error>;

    /// Address of the active interface
    async fn stb_ip(&self) -> Result<String, crate::Error>;

    /// Address of the active interface for one family ("ipv4" / "ipv6")
    async fn stb_ip_family(&self, family: &str) -> Result<String, crate::Error>;

    /// Apply IP settings; `supported` reflects the manual-IP policy
    async fn set_ip_settings(&self, settings: &IpSettings, supported: bool)
    -> Result<(), crate::Error>;

    /// Read IP settings for an interface and version
    async fn ip_settings(
        &self,
        interface: &str,
        ipversion: &str,
    ) -> Result<IpSettingsReport, crate::Error>;

    /// Whether the device can reach the internet
    async fn is_connected_to_internet(&self) -> Result<bool, crate::Error>;

    /// Replace the connectivity test endpoints
    async fn set_connectivity_test_endpoints(&self, endpoints: &[String])
    -> Result<(), crate::Error>;

    /// Resolve the public address through a STUN server
    async fn public_ip(&self, request: &StunRequest) -> Result<String, crate::Error>;
}
