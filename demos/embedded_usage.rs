//! Minimal embedding example for netsrv-core
//!
//! This example drives the network facade against an in-process loopback
//! service that only comes up after a short delay, so the background
//! availability monitor is exercised before requests are served.
//!
//! Environment:
//! - `NETSRV_LOG_LEVEL`: trace, debug, info (default), warn, error
//! - `NETSRV_DEVICE_PROPERTIES`: properties file holding `DEVICE_TYPE`

use anyhow::Context;
use netsrv_core::settings::{AcquisitionStatus, IpSettings, IpSettingsReport};
use netsrv_core::traits::{
    BusClient, DefaultRoute, Diagnostics, EventClass, InterfaceKind, NETWORK_SERVICE_OWNER,
    RawInterface, RouteTextSource, StaticPolicy, StunRequest,
};
use netsrv_core::{
    Collaborators, DeviceMode, NetworkConfig, NetworkFacade, StdLinkLocal,
};
use netsrv_platform::{CommandRouteText, DEVICE_PROPERTIES_PATH, read_device_mode};
use std::env;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio_stream::StreamExt;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

/// Loopback network service
///
/// Reports itself available once `up` is set.
struct LoopbackService {
    up: AtomicBool,
}

impl LoopbackService {
    fn new() -> Self {
        Self {
            up: AtomicBool::new(false),
        }
    }

    fn check(&self) -> netsrv_core::Result<()> {
        if self.up.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(netsrv_core::Error::upstream("loopback service down"))
        }
    }
}

#[async_trait::async_trait]
impl BusClient for LoopbackService {
    async fn is_available(&self, _timeout: Duration) -> netsrv_core::Result<()> {
        self.check()
    }

    async fn subscribe(&self, class: EventClass) -> netsrv_core::Result<()> {
        info!("[Loopback] subscribe {:?} ({})", class, class.id());
        self.check()
    }

    async fn unsubscribe(&self, class: EventClass) -> netsrv_core::Result<()> {
        info!("[Loopback] unsubscribe {:?}", class);
        Ok(())
    }

    async fn interface_list(&self) -> netsrv_core::Result<Vec<RawInterface>> {
        Ok(vec![
            RawInterface {
                name: "eth0".to_string(),
                mac: "00:11:22:33:44:55".to_string(),
                flags: 0x41,
            },
            RawInterface {
                name: "wlan0".to_string(),
                mac: "66:77:88:99:aa:bb".to_string(),
                flags: 0x1,
            },
        ])
    }

    async fn default_route(&self) -> netsrv_core::Result<DefaultRoute> {
        Ok(DefaultRoute {
            interface: "eth0".to_string(),
            gateway: "192.168.1.1".to_string(),
        })
    }

    async fn set_default_interface(
        &self,
        kind: InterfaceKind,
        persist: bool,
    ) -> netsrv_core::Result<()> {
        info!("[Loopback] default interface -> {} (persist={})", kind, persist);
        Ok(())
    }

    async fn is_interface_enabled(&self, kind: InterfaceKind) -> netsrv_core::Result<bool> {
        Ok(kind == InterfaceKind::Ethernet)
    }

    async fn set_interface_enabled(
        &self,
        kind: InterfaceKind,
        enabled: bool,
        _persist: bool,
    ) -> netsrv_core::Result<()> {
        info!("[Loopback] {} enabled={}", kind, enabled);
        Ok(())
    }

    async fn stb_ip(&self) -> netsrv_core::Result<String> {
        Ok("192.168.1.20".to_string())
    }

    async fn stb_ip_family(&self, family: &str) -> netsrv_core::Result<String> {
        match family {
            "AF_INET6" => Ok("2001:db8::20".to_string()),
            _ => Ok("192.168.1.20".to_string()),
        }
    }

    async fn set_ip_settings(
        &self,
        settings: &IpSettings,
        supported: bool,
    ) -> netsrv_core::Result<()> {
        info!(
            "[Loopback] apply {} {} autoconfig={} supported={}",
            settings.interface, settings.ipaddr, settings.autoconfig, supported
        );
        Ok(())
    }

    async fn ip_settings(
        &self,
        interface: &str,
        ipversion: &str,
    ) -> netsrv_core::Result<IpSettingsReport> {
        Ok(IpSettingsReport {
            interface: interface.to_string(),
            ipversion: ipversion.to_string(),
            autoconfig: true,
            ipaddr: "192.168.1.20".to_string(),
            netmask: "255.255.255.0".to_string(),
            gateway: "192.168.1.1".to_string(),
            dhcpserver: "192.168.1.1".to_string(),
            primarydns: "192.168.1.1".to_string(),
            secondarydns: String::new(),
            status: AcquisitionStatus::Acquired,
        })
    }

    async fn is_connected_to_internet(&self) -> netsrv_core::Result<bool> {
        Ok(true)
    }

    async fn set_connectivity_test_endpoints(&self, _endpoints: &[String]) -> netsrv_core::Result<()> {
        Ok(())
    }

    async fn public_ip(&self, request: &StunRequest) -> netsrv_core::Result<String> {
        info!("[Loopback] STUN {}:{}", request.server, request.port);
        Ok("203.0.113.7".to_string())
    }
}

/// Diagnostics that report success without sending anything
struct NoopDiagnostics;

#[async_trait::async_trait]
impl Diagnostics for NoopDiagnostics {
    async fn trace(&self, endpoint: &str, packets: u32) -> netsrv_core::Result<serde_json::Value> {
        Ok(serde_json::json!({ "target": endpoint, "packets": packets, "results": "" }))
    }

    async fn trace_named_endpoint(
        &self,
        endpoint_name: &str,
        packets: u32,
    ) -> netsrv_core::Result<serde_json::Value> {
        self.trace(endpoint_name, packets).await
    }

    async fn ping(
        &self,
        guid: &str,
        endpoint: &str,
        packets: u32,
    ) -> netsrv_core::Result<serde_json::Value> {
        Ok(serde_json::json!({
            "guid": guid,
            "target": endpoint,
            "packetsTransmitted": packets,
            "packetsReceived": packets,
            "success": true,
        }))
    }

    async fn ping_named_endpoint(
        &self,
        guid: &str,
        endpoint_name: &str,
        packets: u32,
    ) -> netsrv_core::Result<serde_json::Value> {
        self.ping(guid, endpoint_name, packets).await
    }
}

fn init_tracing() {
    let log_level = match env::var("NETSRV_LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    println!("=== Embedded netsrv-core Example ===\n");

    let properties =
        env::var("NETSRV_DEVICE_PROPERTIES").unwrap_or_else(|_| DEVICE_PROPERTIES_PATH.to_string());
    let device_mode = read_device_mode(&properties)
        .await
        .with_context(|| format!("reading {}", properties))?;

    let route_text: Option<Arc<dyn RouteTextSource>> = match device_mode {
        DeviceMode::Hybrid => Some(Arc::new(CommandRouteText::new())),
        DeviceMode::MediaClient => None,
    };

    let config = NetworkConfig::new().with_device_mode(device_mode);
    let service = Arc::new(LoopbackService::new());

    println!("1. Creating facade ({:?})...", device_mode);
    let (facade, mut notifications) = NetworkFacade::new(
        Collaborators {
            bus: Arc::clone(&service) as Arc<dyn BusClient>,
            diagnostics: Arc::new(NoopDiagnostics),
            catalog: None,
            link_local: Arc::new(StdLinkLocal),
            route_text,
            manual_ip_policy: Arc::new(StaticPolicy(true)),
        },
        config,
    )?;

    let listener = tokio::spawn(async move {
        while let Some(notification) = notifications.next().await {
            println!("[Notify] {} {}", notification.method(), notification.params());
        }
    });

    println!("2. Initializing while the service is still down...");
    facade.initialize().await?;
    println!("   ready = {}, monitor = {:?}", facade.is_ready(), facade.monitor_state());

    match facade.stb_ip().await {
        Err(e) => println!("   getStbIp before readiness: {}", e),
        Ok(ip) => println!("   getStbIp: {}", ip),
    }

    println!("3. Bringing the service up...");
    tokio::time::sleep(Duration::from_millis(1200)).await;
    service.up.store(true, Ordering::SeqCst);

    while !facade.is_ready() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    println!("   ready = {}, monitor = {:?}", facade.is_ready(), facade.monitor_state());

    println!("4. Serving requests...");
    println!("   interfaces = {:?}", facade.interfaces().await?);
    println!("   default interface = {}", facade.default_interface().await?);
    println!("   stb ip = {}", facade.stb_ip().await?);
    println!("   public ip = {}", facade.public_ip(None, None).await?);

    let rejected = facade
        .set_ip_settings_v2(&serde_json::json!({
            "interface": "ETHERNET",
            "ipversion": "IPv4",
            "autoconfig": false,
            "ipaddr": "192.168.2.10",
            "netmask": "255.255.255.0",
            "gateway": "192.168.1.1",
        }))
        .await;
    println!("   mismatched static settings -> {:?}", rejected.map_err(|e| e.to_string()));

    println!("5. Delivering service events...");
    facade.handle_event(
        NETWORK_SERVICE_OWNER,
        EventClass::InterfaceConnectionStatus.id(),
        br#"{"interface":"wlan0","status":true}"#,
    );
    facade.handle_event(
        NETWORK_SERVICE_OWNER,
        EventClass::DefaultInterface.id(),
        br#"{"oldInterface":"eth0","newInterface":"wlan0"}"#,
    );
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!("6. Shutting down...");
    facade.shutdown().await?;
    drop(facade);
    let _ = tokio::time::timeout(Duration::from_millis(100), listener).await;

    println!("\n=== Embedding Successful ===");
    Ok(())
}
