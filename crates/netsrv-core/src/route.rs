//! Default route resolution
//!
//! Two strategies, chosen once from the [`DeviceMode`]:
//!
//! - **Direct** (media clients): ask the network service for the default
//!   route on every call.
//! - **Parsed** (hybrid devices): parse routing-table text, IPv6 first with an
//!   IPv4 fallback. The first successful result is memoized for the lifetime
//!   of the resolver; a restart is needed to observe a new default route.
//!
//! The text parsing works on substring boundaries (`via` up to `dev`, `dev` up
//! to `metric`) rather than on whitespace tokens.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::DeviceMode;
use crate::error::{Error, Result};
use crate::traits::{BusClient, DefaultRoute, RouteTextSource};

/// Default interface / gateway resolver
pub struct RouteResolver {
    strategy: Strategy,
}

enum Strategy {
    Direct {
        bus: Arc<dyn BusClient>,
        call_timeout: Duration,
    },
    Parsed {
        text: Arc<dyn RouteTextSource>,
        cache: OnceCell<DefaultRoute>,
    },
}

impl RouteResolver {
    /// Resolver that queries the network service
    pub fn direct(bus: Arc<dyn BusClient>, call_timeout: Duration) -> Self {
        Self {
            strategy: Strategy::Direct { bus, call_timeout },
        }
    }

    /// Resolver that parses routing-table text and memoizes the result
    pub fn parsed(text: Arc<dyn RouteTextSource>) -> Self {
        Self {
            strategy: Strategy::Parsed {
                text,
                cache: OnceCell::new(),
            },
        }
    }

    /// Build the resolver matching a device mode
    ///
    /// Hybrid devices need a route text source.
    pub fn for_mode(
        mode: DeviceMode,
        bus: Arc<dyn BusClient>,
        text: Option<Arc<dyn RouteTextSource>>,
        call_timeout: Duration,
    ) -> Result<Self> {
        match (mode, text) {
            (DeviceMode::Hybrid, Some(text)) => Ok(Self::parsed(text)),
            (DeviceMode::Hybrid, None) => Err(Error::config(
                "hybrid device mode requires a route text source",
            )),
            (DeviceMode::MediaClient, _) => Ok(Self::direct(bus, call_timeout)),
        }
    }

    /// Resolve the default route
    ///
    /// # Returns
    ///
    /// - `Some(DefaultRoute)`: with a non-empty interface
    /// - `None`: no default route is available (not an error)
    pub async fn resolve(&self) -> Option<DefaultRoute> {
        let route = match &self.strategy {
            Strategy::Direct { bus, call_timeout } => {
                debug!("Resolving default route through the network service");
                match tokio::time::timeout(*call_timeout, bus.default_route()).await {
                    Ok(Ok(route)) if !route.interface.is_empty() => Some(route),
                    Ok(Ok(_)) => None,
                    Ok(Err(e)) => {
                        warn!("Default route query failed: {}", e);
                        None
                    }
                    Err(_) => {
                        warn!("Default route query timed out after {:?}", call_timeout);
                        None
                    }
                }
            }
            Strategy::Parsed { text, cache } => cache
                .get_or_try_init(|| parse_from_source(text.as_ref()))
                .await
                .ok()
                .cloned(),
        };

        match &route {
            Some(route) => info!(
                "Evaluated default network interface: '{}' and gateway: '{}'",
                route.interface, route.gateway
            ),
            None => warn!("Unable to detect default network interface"),
        }

        route
    }
}

async fn parse_from_source(text: &dyn RouteTextSource) -> Result<DefaultRoute> {
    let ipv6 = text.ipv6_default_route().await.unwrap_or_else(|e| {
        warn!("Failed to read IPv6 default route: {}", e);
        String::new()
    });
    debug!("IPv6 default route text: '{}'", ipv6);

    let mut route = parse_ipv6_default_route(&ipv6);

    if route.interface.is_empty() {
        let table = text.ipv4_route_table().await.unwrap_or_else(|e| {
            warn!("Failed to read IPv4 route table: {}", e);
            String::new()
        });
        debug!("IPv4 route table text: '{}'", table);
        route = parse_ipv4_route_table(&table);
    }

    if route.interface.is_empty() {
        return Err(Error::upstream("no default route in routing tables"));
    }

    Ok(route)
}

/// Extract gateway and interface from `ip -6 route` default-route text
///
/// The gateway is the text between `via` and the next `dev` (empty when no
/// `dev` follows). The interface is the text between `dev` and the next
/// `metric`, or the rest of the line. Both are trimmed.
pub fn parse_ipv6_default_route(text: &str) -> DefaultRoute {
    let gateway = text
        .find("via")
        .map(|pos| {
            let rest = &text[pos + 3..];
            rest.find("dev").map(|end| &rest[..end]).unwrap_or("")
        })
        .unwrap_or("");

    let interface = text
        .find("dev")
        .map(|pos| {
            let rest = &text[pos + 3..];
            rest.find("metric").map(|end| &rest[..end]).unwrap_or(rest)
        })
        .unwrap_or("");

    DefaultRoute {
        interface: interface.trim().to_string(),
        gateway: gateway.trim().to_string(),
    }
}

/// Extract gateway and interface from a `route -n` table
///
/// Uses the first line flagged `UG`. The gateway is the token starting three
/// characters after the first space, cut at the next space; the interface is
/// whatever follows the last space.
pub fn parse_ipv4_route_table(table: &str) -> DefaultRoute {
    let Some(line) = table.lines().find(|line| is_gateway_line(line)) else {
        return DefaultRoute::default();
    };

    let gateway = line
        .find(' ')
        .map(|pos| {
            let rest = line.get(pos + 3..).unwrap_or_default().trim();
            rest.find(' ').map(|end| &rest[..end]).unwrap_or("")
        })
        .unwrap_or("");

    let interface = line.rfind(' ').map(|pos| &line[pos..]).unwrap_or("");

    DefaultRoute {
        interface: interface.trim().to_string(),
        gateway: gateway.trim().to_string(),
    }
}

fn is_gateway_line(line: &str) -> bool {
    line.contains("UG ") || line.contains("UG\t")
}
