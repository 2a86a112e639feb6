//! Test doubles and common utilities for facade contract tests
//!
//! The fakes record every call they receive so tests can assert on what did
//! (and did not) reach the network service.

#![allow(dead_code)]

use netsrv_core::config::NetworkConfig;
use netsrv_core::error::{Error, Result};
use netsrv_core::settings::{AcquisitionStatus, IpSettings, IpSettingsReport};
use netsrv_core::traits::{
    BusClient, DefaultRoute, Diagnostics, EventClass, InterfaceKind, RawInterface,
    RouteTextSource, StaticPolicy, StunRequest,
};
use netsrv_core::{Collaborators, NetworkFacade, NotificationStream, StdLinkLocal};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-process network service that records calls
pub struct FakeBus {
    available: AtomicBool,
    /// Number of subscribe() calls that succeed before one fails
    subscribe_failures_after: Mutex<Option<usize>>,
    probe_count: AtomicUsize,
    subscribe_count: AtomicUsize,
    unsubscribe_count: AtomicUsize,
    /// Calls other than probe/subscribe/unsubscribe
    data_call_count: AtomicUsize,
    subscribed: Mutex<Vec<EventClass>>,
    route: Mutex<DefaultRoute>,
    interfaces: Mutex<Vec<RawInterface>>,
    report: Mutex<Option<IpSettingsReport>>,
    applied: Mutex<Vec<(IpSettings, bool)>>,
    kinds: Mutex<Vec<InterfaceKind>>,
    stun_requests: Mutex<Vec<StunRequest>>,
    test_endpoints: Mutex<Vec<String>>,
    stb_ip: Mutex<Option<String>>,
    /// Delay applied to data calls
    latency: Mutex<Duration>,
}

impl FakeBus {
    pub fn new(available: bool) -> Self {
        Self {
            available: AtomicBool::new(available),
            subscribe_failures_after: Mutex::new(None),
            probe_count: AtomicUsize::new(0),
            subscribe_count: AtomicUsize::new(0),
            unsubscribe_count: AtomicUsize::new(0),
            data_call_count: AtomicUsize::new(0),
            subscribed: Mutex::new(Vec::new()),
            route: Mutex::new(DefaultRoute {
                interface: "eth0".to_string(),
                gateway: "192.168.1.1".to_string(),
            }),
            interfaces: Mutex::new(Vec::new()),
            report: Mutex::new(None),
            applied: Mutex::new(Vec::new()),
            kinds: Mutex::new(Vec::new()),
            stun_requests: Mutex::new(Vec::new()),
            test_endpoints: Mutex::new(Vec::new()),
            stb_ip: Mutex::new(Some("192.168.1.20".to_string())),
            latency: Mutex::new(Duration::ZERO),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Let `n` subscribe() calls succeed, then fail every later one
    pub fn fail_subscribe_after(&self, n: usize) {
        *self.subscribe_failures_after.lock().unwrap() = Some(n);
    }

    pub fn allow_subscribe(&self) {
        *self.subscribe_failures_after.lock().unwrap() = None;
    }

    pub fn set_route(&self, interface: &str, gateway: &str) {
        *self.route.lock().unwrap() = DefaultRoute {
            interface: interface.to_string(),
            gateway: gateway.to_string(),
        };
    }

    pub fn set_interfaces(&self, interfaces: Vec<RawInterface>) {
        *self.interfaces.lock().unwrap() = interfaces;
    }

    pub fn set_report(&self, report: IpSettingsReport) {
        *self.report.lock().unwrap() = Some(report);
    }

    pub fn set_stb_ip(&self, ip: Option<&str>) {
        *self.stb_ip.lock().unwrap() = ip.map(str::to_string);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn probe_count(&self) -> usize {
        self.probe_count.load(Ordering::SeqCst)
    }

    pub fn subscribe_count(&self) -> usize {
        self.subscribe_count.load(Ordering::SeqCst)
    }

    pub fn unsubscribe_count(&self) -> usize {
        self.unsubscribe_count.load(Ordering::SeqCst)
    }

    pub fn data_call_count(&self) -> usize {
        self.data_call_count.load(Ordering::SeqCst)
    }

    /// Classes currently registered
    pub fn subscribed(&self) -> Vec<EventClass> {
        self.subscribed.lock().unwrap().clone()
    }

    pub fn applied(&self) -> Vec<(IpSettings, bool)> {
        self.applied.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<InterfaceKind> {
        self.kinds.lock().unwrap().clone()
    }

    pub fn stun_requests(&self) -> Vec<StunRequest> {
        self.stun_requests.lock().unwrap().clone()
    }

    pub fn test_endpoints(&self) -> Vec<String> {
        self.test_endpoints.lock().unwrap().clone()
    }

    async fn data_call(&self) {
        self.data_call_count.fetch_add(1, Ordering::SeqCst);
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait::async_trait]
impl BusClient for FakeBus {
    async fn is_available(&self, _timeout: Duration) -> Result<()> {
        self.probe_count.fetch_add(1, Ordering::SeqCst);
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::upstream("service not registered"))
        }
    }

    async fn subscribe(&self, class: EventClass) -> Result<()> {
        let attempt = self.subscribe_count.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = *self.subscribe_failures_after.lock().unwrap() {
            if attempt >= limit {
                return Err(Error::upstream(format!("subscribe {:?} refused", class)));
            }
        }
        self.subscribed.lock().unwrap().push(class);
        Ok(())
    }

    async fn unsubscribe(&self, class: EventClass) -> Result<()> {
        self.unsubscribe_count.fetch_add(1, Ordering::SeqCst);
        self.subscribed.lock().unwrap().retain(|c| *c != class);
        Ok(())
    }

    async fn interface_list(&self) -> Result<Vec<RawInterface>> {
        self.data_call().await;
        Ok(self.interfaces.lock().unwrap().clone())
    }

    async fn default_route(&self) -> Result<DefaultRoute> {
        self.data_call().await;
        Ok(self.route.lock().unwrap().clone())
    }

    async fn set_default_interface(&self, kind: InterfaceKind, _persist: bool) -> Result<()> {
        self.data_call().await;
        self.kinds.lock().unwrap().push(kind);
        Ok(())
    }

    async fn is_interface_enabled(&self, kind: InterfaceKind) -> Result<bool> {
        self.data_call().await;
        self.kinds.lock().unwrap().push(kind);
        Ok(kind == InterfaceKind::Ethernet)
    }

    async fn set_interface_enabled(
        &self,
        kind: InterfaceKind,
        _enabled: bool,
        _persist: bool,
    ) -> Result<()> {
        self.data_call().await;
        self.kinds.lock().unwrap().push(kind);
        Ok(())
    }

    async fn stb_ip(&self) -> Result<String> {
        self.data_call().await;
        self.stb_ip
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::upstream("no address"))
    }

    async fn stb_ip_family(&self, family: &str) -> Result<String> {
        self.data_call().await;
        match family {
            "AF_INET" => Ok("192.168.1.20".to_string()),
            "AF_INET6" => Ok("2001:db8::20".to_string()),
            other => Err(Error::upstream(format!("unknown family {}", other))),
        }
    }

    async fn set_ip_settings(&self, settings: &IpSettings, supported: bool) -> Result<()> {
        self.data_call().await;
        self.applied.lock().unwrap().push((settings.clone(), supported));
        Ok(())
    }

    async fn ip_settings(&self, _interface: &str, _ipversion: &str) -> Result<IpSettingsReport> {
        self.data_call().await;
        self.report
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::upstream("no report"))
    }

    async fn is_connected_to_internet(&self) -> Result<bool> {
        self.data_call().await;
        Ok(true)
    }

    async fn set_connectivity_test_endpoints(&self, endpoints: &[String]) -> Result<()> {
        self.data_call().await;
        *self.test_endpoints.lock().unwrap() = endpoints.to_vec();
        Ok(())
    }

    async fn public_ip(&self, request: &StunRequest) -> Result<String> {
        self.data_call().await;
        self.stun_requests.lock().unwrap().push(request.clone());
        Ok("203.0.113.7".to_string())
    }
}

/// Route text source whose output can be swapped between calls
pub struct ScriptedRouteText {
    ipv6: Mutex<String>,
    ipv4: Mutex<String>,
    reads: AtomicUsize,
}

impl ScriptedRouteText {
    pub fn new(ipv6: &str, ipv4: &str) -> Self {
        Self {
            ipv6: Mutex::new(ipv6.to_string()),
            ipv4: Mutex::new(ipv4.to_string()),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn replace(&self, ipv6: &str, ipv4: &str) {
        *self.ipv6.lock().unwrap() = ipv6.to_string();
        *self.ipv4.lock().unwrap() = ipv4.to_string();
    }

    /// Number of text reads (IPv6 and IPv4 combined)
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RouteTextSource for ScriptedRouteText {
    async fn ipv6_default_route(&self) -> Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.ipv6.lock().unwrap().clone())
    }

    async fn ipv4_route_table(&self) -> Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.ipv4.lock().unwrap().clone())
    }
}

/// Diagnostics runner that echoes its arguments
#[derive(Default)]
pub struct EchoDiagnostics {
    packets: Mutex<Vec<u32>>,
    succeed: AtomicBool,
}

impl EchoDiagnostics {
    pub fn new(succeed: bool) -> Self {
        Self {
            packets: Mutex::new(Vec::new()),
            succeed: AtomicBool::new(succeed),
        }
    }

    /// Packet counts received, in call order
    pub fn packets(&self) -> Vec<u32> {
        self.packets.lock().unwrap().clone()
    }

    fn report(&self, target: &str, packets: u32) -> serde_json::Value {
        self.packets.lock().unwrap().push(packets);
        serde_json::json!({
            "target": target,
            "packetsTransmitted": packets,
            "success": self.succeed.load(Ordering::SeqCst),
        })
    }
}

#[async_trait::async_trait]
impl Diagnostics for EchoDiagnostics {
    async fn trace(&self, endpoint: &str, packets: u32) -> Result<serde_json::Value> {
        Ok(self.report(endpoint, packets))
    }

    async fn trace_named_endpoint(
        &self,
        endpoint_name: &str,
        packets: u32,
    ) -> Result<serde_json::Value> {
        Ok(self.report(endpoint_name, packets))
    }

    async fn ping(&self, _guid: &str, endpoint: &str, packets: u32) -> Result<serde_json::Value> {
        Ok(self.report(endpoint, packets))
    }

    async fn ping_named_endpoint(
        &self,
        _guid: &str,
        endpoint_name: &str,
        packets: u32,
    ) -> Result<serde_json::Value> {
        Ok(self.report(endpoint_name, packets))
    }
}

/// Test configuration with short probe timeouts
pub fn test_config() -> NetworkConfig {
    let mut config = NetworkConfig::new();
    config.availability.probe_timeout_ms = 100;
    config.availability.retry_interval_ms = 500;
    config.call_timeout_ms = 1000;
    config
}

/// Collaborators around a fake bus
pub fn collaborators(bus: &Arc<FakeBus>, manual_ip_enabled: bool) -> Collaborators {
    Collaborators {
        bus: Arc::clone(bus) as Arc<dyn BusClient>,
        diagnostics: Arc::new(EchoDiagnostics::new(true)),
        catalog: None,
        link_local: Arc::new(StdLinkLocal),
        route_text: None,
        manual_ip_policy: Arc::new(StaticPolicy(manual_ip_enabled)),
    }
}

/// Facade built with default collaborators, not yet initialized
pub fn facade(bus: &Arc<FakeBus>, config: NetworkConfig) -> (NetworkFacade, NotificationStream) {
    NetworkFacade::new(collaborators(bus, true), config).expect("facade construction succeeds")
}

/// Facade over an available bus, initialized and ready
pub async fn ready_facade(bus: &Arc<FakeBus>) -> (NetworkFacade, NotificationStream) {
    let (facade, notifications) = facade(bus, test_config());
    facade.initialize().await.expect("initialize succeeds");
    assert!(facade.is_ready(), "facade should be ready over an available bus");
    (facade, notifications)
}

/// An acquired IPv4 report for `interface`
pub fn acquired_report(interface: &str, autoconfig: bool) -> IpSettingsReport {
    IpSettingsReport {
        interface: interface.to_string(),
        ipversion: "IPv4".to_string(),
        autoconfig,
        ipaddr: "192.168.1.20".to_string(),
        netmask: "255.255.255.0".to_string(),
        gateway: "192.168.1.1".to_string(),
        dhcpserver: "192.168.1.1".to_string(),
        primarydns: "8.8.8.8".to_string(),
        secondarydns: String::new(),
        status: AcquisitionStatus::Acquired,
    }
}
