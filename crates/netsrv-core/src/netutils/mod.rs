// # Default Interface Utilities
//
// Table-driven implementations of the catalog and link-local capabilities.
//
// ## When to Use
//
// - Devices whose interface names are fixed at build time (`eth0`, `wlan0`)
// - Tests that need a realistic catalog without a platform lookup

use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::traits::{InterfaceCatalog, InterfaceKind, LinkLocalCheck};

/// Interface catalog backed by a fixed token table
///
/// # Example
///
/// ```rust
/// use netsrv_core::netutils::StaticInterfaceCatalog;
/// use netsrv_core::traits::{InterfaceCatalog, InterfaceKind};
///
/// let catalog = StaticInterfaceCatalog::default();
/// assert_eq!(catalog.kind_of("eth0"), Some(InterfaceKind::Ethernet));
/// assert_eq!(catalog.describe("docker0"), "");
/// ```
#[derive(Debug, Clone)]
pub struct StaticInterfaceCatalog {
    table: HashMap<String, InterfaceKind>,
}

impl StaticInterfaceCatalog {
    /// Create a catalog from a token table
    pub fn new(table: HashMap<String, InterfaceKind>) -> Self {
        Self { table }
    }

    /// Number of known interfaces
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the catalog knows no interfaces
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for StaticInterfaceCatalog {
    fn default() -> Self {
        Self::new(crate::config::default_interfaces())
    }
}

impl InterfaceCatalog for StaticInterfaceCatalog {
    fn kind_of(&self, token: &str) -> Option<InterfaceKind> {
        self.table.get(token).copied()
    }
}

/// Link-local check using the standard address types
///
/// IPv4: `169.254.0.0/16`. IPv6: `fe80::/10`. Unparsable text is not
/// link-local.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdLinkLocal;

impl LinkLocalCheck for StdLinkLocal {
    fn is_ipv4_link_local(&self, address: &str) -> bool {
        address
            .trim()
            .parse::<Ipv4Addr>()
            .map(|ip| ip.is_link_local())
            .unwrap_or(false)
    }

    fn is_ipv6_link_local(&self, address: &str) -> bool {
        // Tolerate a zone suffix ("fe80::1%eth0")
        let address = address.trim().split('%').next().unwrap_or_default();
        address
            .parse::<Ipv6Addr>()
            .map(|ip| ip.segments()[0] & 0xffc0 == 0xfe80)
            .unwrap_or(false)
    }
}
