//! Network facade
//!
//! The NetworkFacade is responsible for:
//! - Bringing up the event subscription (directly or through the monitor)
//! - Gating every service call on readiness
//! - Validating requests before they reach the network service
//! - Translating bus events into notifications
//!
//! ## Architecture
//!
//! ```text
//!   requests ──▶ NetworkFacade ──▶ notifications
//!                      │
//!                      ├── ConfigValidator    (static IPv4 checks)
//!                      ├── RouteResolver      (default interface)
//!                      ├── BusClient          (network service calls)
//!                      ├── AvailabilityMonitor (background probe + subscribe)
//!                      └── EventTranslator    (bus events to notifications)
//! ```
//!
//! ## Lifecycle
//!
//! 1. Create with [`NetworkFacade::new()`]
//! 2. [`NetworkFacade::initialize()`]: bounded availability check, then
//!    subscribe, or hand off to the background monitor
//! 3. Serve requests; feed bus events to [`NetworkFacade::handle_event()`]
//! 4. [`NetworkFacade::shutdown()`]: stop the monitor, then unsubscribe

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::config::{AvailabilityConfig, EventPolicy, MAX_STUN_SERVER_LEN, NetworkConfig, StunConfig};
use crate::error::{Error, Result};
use crate::events::{EventTranslator, Notification};
use crate::lifecycle::{AvailabilityMonitor, MonitorState, Readiness, SubscriptionSet, monitor};
use crate::netutils::StaticInterfaceCatalog;
use crate::route::RouteResolver;
use crate::settings::{IpSettings, IpSettingsView};
use crate::traits::{
    BusClient, Diagnostics, InterfaceCatalog, InterfaceKind, LinkLocalCheck, ManualIpPolicy,
    NETWORK_SERVICE_OWNER, RouteTextSource, StunRequest,
};
use crate::validator;

/// Static quirk identifiers reported by `getQuirks`
pub const QUIRKS: &[&str] = &["RDK-20093"];

/// Endpoint names accepted by the named trace/ping operations
pub const NAMED_ENDPOINTS: &[&str] = &["CMTS"];

/// Packet count for pings when the caller gives none
pub const DEFAULT_PING_PACKETS: u32 = 15;

/// Maximum number of connectivity test endpoints
pub const MAX_TEST_ENDPOINTS: usize = 5;

/// Maximum interface name length for public address lookups (exclusive)
pub const MAX_INTERFACE_NAME_LEN: usize = 16;

const IFF_UP: u32 = 0x1;
const IFF_RUNNING: u32 = 0x40;

/// Stream of notifications produced from bus events
pub type NotificationStream = ReceiverStream<Notification>;

/// Platform collaborators the facade is built from
pub struct Collaborators {
    pub bus: Arc<dyn BusClient>,
    pub diagnostics: Arc<dyn Diagnostics>,
    /// Built from [`NetworkConfig::interfaces`] when absent
    pub catalog: Option<Arc<dyn InterfaceCatalog>>,
    pub link_local: Arc<dyn LinkLocalCheck>,
    /// Required for hybrid devices
    pub route_text: Option<Arc<dyn RouteTextSource>>,
    pub manual_ip_policy: Arc<dyn ManualIpPolicy>,
}

/// Entry of `getInterfaces`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceInfo {
    pub interface: String,
    pub mac_address: String,
    pub enabled: bool,
    pub connected: bool,
}

/// Successful `setIPSettings` result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetIpSettingsOutcome {
    /// Whether manual settings were permitted by policy for this request
    pub supported: bool,
}

/// Network interface facade
///
/// Every operation except the informational ones fails with
/// [`Error::NotReady`] until the event subscription is in place, and does so
/// without touching the bus.
pub struct NetworkFacade {
    bus: Arc<dyn BusClient>,
    diagnostics: Arc<dyn Diagnostics>,
    catalog: Arc<dyn InterfaceCatalog>,
    manual_ip_policy: Arc<dyn ManualIpPolicy>,
    readiness: Arc<Readiness>,
    subscriptions: Arc<SubscriptionSet>,
    monitor: AvailabilityMonitor,
    resolver: RouteResolver,
    translator: EventTranslator,
    stun: Mutex<StunConfig>,
    policy: EventPolicy,
    availability: AvailabilityConfig,
    call_timeout: Duration,
    notification_tx: mpsc::Sender<Notification>,
}

impl NetworkFacade {
    /// Create a new facade
    ///
    /// # Returns
    ///
    /// A tuple of (facade, notifications) where notifications yields the
    /// translated bus events
    pub fn new(
        collaborators: Collaborators,
        config: NetworkConfig,
    ) -> Result<(Self, NotificationStream)> {
        config.validate()?;

        let Collaborators {
            bus,
            diagnostics,
            catalog,
            link_local,
            route_text,
            manual_ip_policy,
        } = collaborators;
        let catalog = catalog.unwrap_or_else(|| {
            Arc::new(StaticInterfaceCatalog::new(config.interfaces.clone())) as Arc<dyn InterfaceCatalog>
        });

        let call_timeout = config.call_timeout();
        let readiness = Arc::new(Readiness::new());
        let subscriptions = Arc::new(SubscriptionSet::new(Arc::clone(&bus)));
        let monitor = AvailabilityMonitor::new(
            Arc::clone(&bus),
            Arc::clone(&subscriptions),
            Arc::clone(&readiness),
            config.availability.probe_timeout(),
            config.availability.retry_interval(),
        );
        let resolver =
            RouteResolver::for_mode(config.device_mode, Arc::clone(&bus), route_text, call_timeout)?;
        let translator = EventTranslator::new(Arc::clone(&catalog), link_local, config.policy);

        let (tx, rx) = mpsc::channel(config.notification_channel_capacity);

        let facade = Self {
            bus,
            diagnostics,
            catalog,
            manual_ip_policy,
            readiness,
            subscriptions,
            monitor,
            resolver,
            translator,
            stun: Mutex::new(config.stun),
            policy: config.policy,
            availability: config.availability,
            call_timeout,
            notification_tx: tx,
        };

        Ok((facade, ReceiverStream::new(rx)))
    }

    /// Bring up the event subscription
    ///
    /// Probes the network service a bounded number of times. If it answers,
    /// subscribes and becomes ready; otherwise starts the background monitor
    /// and returns without waiting for it.
    pub async fn initialize(&self) -> Result<()> {
        let attempts = self.availability.startup_probe_attempts;
        let mut available = false;

        for attempt in 0..attempts {
            match monitor::probe(self.bus.as_ref(), self.availability.probe_timeout()).await {
                Ok(()) => {
                    available = true;
                    break;
                }
                Err(e) => {
                    debug!("Network service is not available ({}), retry = {}", e, attempt);
                    if attempt + 1 < attempts {
                        tokio::time::sleep(self.availability.retry_interval()).await;
                    }
                }
            }
        }

        if available {
            match self.subscriptions.subscribe_all().await {
                Ok(_) => {
                    self.readiness.mark_ready();
                    info!("Successfully activated network facade");
                    return Ok(());
                }
                Err(e) => warn!("Initial event subscription failed: {}", e),
            }
        }

        self.monitor.start();
        Ok(())
    }

    /// Tear down the event subscription
    ///
    /// Waits for the background monitor to stop before unsubscribing.
    pub async fn shutdown(&self) -> Result<()> {
        let state = self.monitor.shutdown().await;
        debug!("Availability monitor stopped in state {:?}", state);
        self.readiness.reset();

        self.subscriptions.unsubscribe_all().await?;
        info!("Network facade shut down");
        Ok(())
    }

    /// Whether requests are being served
    pub fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }

    /// State of the background availability monitor
    pub fn monitor_state(&self) -> MonitorState {
        self.monitor.state()
    }

    /// Deliver a raw bus event
    ///
    /// Called by the bus transport for every event of the subscribed classes.
    pub fn handle_event(&self, owner: &str, event_id: u32, payload: &[u8]) {
        if let Some(notification) = self.translator.translate(owner, event_id, payload) {
            self.emit(notification);
        }
    }

    /// `getQuirks`
    pub fn quirks(&self) -> &'static [&'static str] {
        QUIRKS
    }

    /// `getNamedEndpoints`
    pub fn named_endpoints(&self) -> &'static [&'static str] {
        NAMED_ENDPOINTS
    }

    /// `getInterfaces`
    pub async fn interfaces(&self) -> Result<Vec<InterfaceInfo>> {
        self.ensure_ready("getInterfaces")?;
        let list = self.call("getInterfaceList", self.bus.interface_list()).await?;

        Ok(list
            .into_iter()
            .filter_map(|raw| {
                let interface = self.catalog.describe(&raw.name);
                if interface.is_empty() && self.policy.defined_interfaces_only {
                    return None;
                }
                Some(InterfaceInfo {
                    interface,
                    mac_address: raw.mac,
                    enabled: raw.flags & IFF_UP != 0,
                    connected: raw.flags & IFF_RUNNING != 0,
                })
            })
            .collect())
    }

    /// `getDefaultInterface`: kind of the interface carrying the default route
    pub async fn default_interface(&self) -> Result<String> {
        self.ensure_ready("getDefaultInterface")?;
        let route = self
            .resolver
            .resolve()
            .await
            .ok_or_else(|| Error::upstream("no default route available"))?;

        Ok(self.catalog.describe(&route.interface))
    }

    /// `setDefaultInterface`
    pub async fn set_default_interface(&self, interface: &str, persist: bool) -> Result<()> {
        self.ensure_ready("setDefaultInterface")?;
        let kind = parse_kind("setDefaultInterface", interface)?;
        self.call("setDefaultInterface", self.bus.set_default_interface(kind, persist))
            .await
    }

    /// `isInterfaceEnabled`
    pub async fn is_interface_enabled(&self, interface: &str) -> Result<bool> {
        self.ensure_ready("isInterfaceEnabled")?;
        let kind = parse_kind("isInterfaceEnabled", interface)?;
        let enabled = self
            .call("isInterfaceEnabled", self.bus.is_interface_enabled(kind))
            .await?;
        info!("isInterfaceEnabled :: {} enabled = {}", kind, enabled);
        Ok(enabled)
    }

    /// `setInterfaceEnabled`
    pub async fn set_interface_enabled(
        &self,
        interface: &str,
        enabled: bool,
        persist: bool,
    ) -> Result<()> {
        self.ensure_ready("setInterfaceEnabled")?;
        let kind = parse_kind("setInterfaceEnabled", interface)?;
        self.call(
            "setInterfaceEnabled",
            self.bus.set_interface_enabled(kind, enabled, persist),
        )
        .await
    }

    /// `getStbIp`: empty when the service cannot tell
    pub async fn stb_ip(&self) -> Result<String> {
        self.ensure_ready("getStbIp")?;
        Ok(self
            .call("getSTBip", self.bus.stb_ip())
            .await
            .unwrap_or_default())
    }

    /// `getSTBIPFamily`
    pub async fn stb_ip_family(&self, family: Option<&str>) -> Result<String> {
        self.ensure_ready("getSTBIPFamily")?;
        let family = family.ok_or_else(|| {
            warn!("Required family attribute is not provided");
            Error::invalid_argument("family is required")
        })?;
        self.call("getSTBip_family", self.bus.stb_ip_family(family))
            .await
    }

    /// `setIPSettings` (v1): every field is required
    pub async fn set_ip_settings_v1(
        &self,
        params: &serde_json::Value,
    ) -> Result<SetIpSettingsOutcome> {
        self.ensure_ready("setIPSettings")?;
        let settings = IpSettings::from_v1_params(params)?;
        self.set_ip_settings(&settings).await
    }

    /// `setIPSettings` (v2): omitted fields take their defaults
    pub async fn set_ip_settings_v2(
        &self,
        params: &serde_json::Value,
    ) -> Result<SetIpSettingsOutcome> {
        self.ensure_ready("setIPSettings")?;
        let settings = IpSettings::from_v2_params(params)?;
        self.set_ip_settings(&settings).await
    }

    /// Validate and apply IP settings
    ///
    /// Autoconfig requests are forwarded unchanged. Manual requests must pass
    /// the policy flag and the static IPv4 checks first.
    pub async fn set_ip_settings(&self, settings: &IpSettings) -> Result<SetIpSettingsOutcome> {
        self.ensure_ready("setIPSettings")?;

        let supported = !settings.autoconfig && self.manual_ip_policy.manual_ip_enabled();

        if let Err(reason) = validator::validate(settings, supported) {
            warn!("Rejecting IP settings for {}: {}", settings.interface, reason);
            return Err(reason.into());
        }

        self.call("setIPSettings", self.bus.set_ip_settings(settings, supported))
            .await?;
        Ok(SetIpSettingsOutcome { supported })
    }

    /// `getIPSettings` (v1): full record once the address is acquired
    pub async fn ip_settings_v1(&self, interface: &str, ipversion: &str) -> Result<IpSettingsView> {
        self.ensure_ready("getIPSettings")?;
        let report = self
            .call("getIPSettings", self.bus.ip_settings(interface, ipversion))
            .await?;

        IpSettingsView::v1(&report).ok_or_else(|| {
            Error::upstream(format!("address not acquired ({:?})", report.status))
        })
    }

    /// `getIPSettings` (v2): partial record while acquisition is pending
    pub async fn ip_settings_v2(&self, interface: &str, ipversion: &str) -> Result<IpSettingsView> {
        self.ensure_ready("getIPSettings")?;
        let report = self
            .call("getIPSettings", self.bus.ip_settings(interface, ipversion))
            .await?;

        IpSettingsView::v2(&report)
            .ok_or_else(|| Error::upstream(format!("IP settings unavailable ({:?})", report.status)))
    }

    /// `isConnectedToInternet`
    pub async fn is_connected_to_internet(&self) -> Result<bool> {
        self.ensure_ready("isConnectedToInternet")?;
        let connected = self
            .call("isConnectedToInternet", self.bus.is_connected_to_internet())
            .await?;
        info!("isConnectedToInternet :: connected = {}", connected);
        Ok(connected)
    }

    /// `setConnectivityTestEndpoints`: 1 to 5 strings
    pub async fn set_connectivity_test_endpoints(
        &self,
        endpoints: &[serde_json::Value],
    ) -> Result<()> {
        self.ensure_ready("setConnectivityTestEndpoints")?;

        if endpoints.is_empty() || endpoints.len() > MAX_TEST_ENDPOINTS {
            return Err(Error::invalid_argument(format!(
                "1 to {} test endpoints are allowed",
                MAX_TEST_ENDPOINTS
            )));
        }

        let endpoints = endpoints
            .iter()
            .map(|endpoint| {
                endpoint
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| Error::invalid_argument("test endpoints must be strings"))
            })
            .collect::<Result<Vec<_>>>()?;

        self.call(
            "setConnectivityTestEndpoints",
            self.bus.set_connectivity_test_endpoints(&endpoints),
        )
        .await
    }

    /// `setStunEndPoint`: defaults for later public address lookups
    ///
    /// Makes no external call, so it is not gated on readiness. The values
    /// are checked when they are used.
    pub fn set_stun_endpoint(&self, stun: StunConfig) {
        let mut current = self.stun.lock().unwrap_or_else(|p| p.into_inner());
        *current = stun;
    }

    /// `getPublicIP`
    pub async fn public_ip(&self, iface: Option<&str>, ipv6: Option<bool>) -> Result<String> {
        self.ensure_ready("getPublicIP")?;

        let stun = self.stun.lock().unwrap_or_else(|p| p.into_inner()).clone();
        let request = StunRequest {
            server: stun.server,
            port: stun.port,
            ipv6: ipv6.unwrap_or(false),
            interface: iface.unwrap_or_default().to_string(),
            bind_timeout: stun.bind_timeout,
            cache_timeout: stun.cache_timeout,
            sync: stun.sync,
        };
        validate_stun_request(&request)?;

        info!(
            "getPublicIP called with server={} port={} iface={} ipv6={} sync={} timeout={} cache_timeout={}",
            request.server,
            request.port,
            request.interface,
            request.ipv6,
            request.sync,
            request.bind_timeout,
            request.cache_timeout
        );

        self.call("getPublicIP", self.bus.public_ip(&request)).await
    }

    /// `trace`
    pub async fn trace(&self, endpoint: Option<&str>, packets: Option<u32>) -> Result<serde_json::Value> {
        self.ensure_ready("trace")?;
        let endpoint = endpoint.ok_or_else(|| Error::invalid_argument("no endpoint specified"))?;
        self.diagnostics
            .trace(endpoint, packets.unwrap_or_default())
            .await
            .map_err(|e| diagnostics_failed("trace", e))
    }

    /// `traceNamedEndpoint`
    pub async fn trace_named_endpoint(
        &self,
        endpoint_name: Option<&str>,
        packets: Option<u32>,
    ) -> Result<serde_json::Value> {
        self.ensure_ready("traceNamedEndpoint")?;
        let endpoint_name =
            endpoint_name.ok_or_else(|| Error::invalid_argument("no endpointName specified"))?;
        self.diagnostics
            .trace_named_endpoint(endpoint_name, packets.unwrap_or_default())
            .await
            .map_err(|e| diagnostics_failed("traceNamedEndpoint", e))
    }

    /// `ping`
    ///
    /// A report whose `success` field is not `true` fails with
    /// [`Error::UpstreamUnavailable`].
    pub async fn ping(
        &self,
        guid: &str,
        endpoint: Option<&str>,
        packets: Option<u32>,
    ) -> Result<serde_json::Value> {
        self.ensure_ready("ping")?;
        let endpoint = endpoint.ok_or_else(|| Error::invalid_argument("no endpoint argument"))?;
        let report = self
            .diagnostics
            .ping(guid, endpoint, packets.unwrap_or(DEFAULT_PING_PACKETS))
            .await
            .map_err(|e| diagnostics_failed("ping", e))?;
        ping_outcome("ping", report)
    }

    /// `pingNamedEndpoint`, with the same failure rule as [`Self::ping`]
    pub async fn ping_named_endpoint(
        &self,
        guid: &str,
        endpoint_name: Option<&str>,
        packets: Option<u32>,
    ) -> Result<serde_json::Value> {
        self.ensure_ready("pingNamedEndpoint")?;
        let endpoint_name =
            endpoint_name.ok_or_else(|| Error::invalid_argument("no endpointName argument"))?;
        let report = self
            .diagnostics
            .ping_named_endpoint(guid, endpoint_name, packets.unwrap_or(DEFAULT_PING_PACKETS))
            .await
            .map_err(|e| diagnostics_failed("pingNamedEndpoint", e))?;
        ping_outcome("pingNamedEndpoint", report)
    }

    fn ensure_ready(&self, operation: &str) -> Result<()> {
        if self.readiness.is_ready() {
            return Ok(());
        }
        warn!("Network facade not initialised yet returning from {}", operation);
        Err(Error::not_ready(operation))
    }

    /// Run one bus call under the call timeout
    ///
    /// Failures surface as `UpstreamUnavailable`; the cause is only logged.
    async fn call<T>(
        &self,
        method: &str,
        request: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.call_timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!("Call to {} for {} failed: {}", NETWORK_SERVICE_OWNER, method, e);
                Err(Error::upstream(format!("{} failed", method)))
            }
            Err(_) => {
                warn!(
                    "Call to {} for {} timed out after {:?}",
                    NETWORK_SERVICE_OWNER, method, self.call_timeout
                );
                Err(Error::upstream(format!("{} timed out", method)))
            }
        }
    }

    fn emit(&self, notification: Notification) {
        if self.notification_tx.try_send(notification).is_err() {
            warn!("Notification channel full or closed, dropping notification. Consider increasing notification_channel_capacity.");
        }
    }
}

fn parse_kind(operation: &str, interface: &str) -> Result<InterfaceKind> {
    interface.parse().inspect_err(|_| {
        warn!("Call for {} failed due to invalid interface [{}]", operation, interface);
    })
}

fn validate_stun_request(request: &StunRequest) -> Result<()> {
    if request.server.len() >= MAX_STUN_SERVER_LEN {
        return Err(Error::invalid_argument(format!(
            "server exceeds max length of {}",
            MAX_STUN_SERVER_LEN
        )));
    }
    if !request.server.is_empty() && request.port == 0 {
        return Err(Error::invalid_argument("port missing"));
    }
    if request.port != 0 && request.server.is_empty() {
        return Err(Error::invalid_argument("server missing"));
    }
    if request.interface.len() >= MAX_INTERFACE_NAME_LEN {
        return Err(Error::invalid_argument(format!(
            "interface exceeds max length of {}",
            MAX_INTERFACE_NAME_LEN
        )));
    }
    Ok(())
}

fn diagnostics_failed(operation: &str, err: Error) -> Error {
    warn!("Failed to perform {}: {}", operation, err);
    Error::upstream(format!("{} failed", operation))
}

fn ping_outcome(operation: &str, report: serde_json::Value) -> Result<serde_json::Value> {
    if report.get("success").and_then(serde_json::Value::as_bool) == Some(true) {
        return Ok(report);
    }
    warn!("{} reported failure: {}", operation, report);
    Err(Error::upstream(format!("{} failed", operation)))
}
