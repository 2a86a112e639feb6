// # Interface Catalog Traits
//
// Capabilities owned by the platform that this crate only consumes:
//
// - [`InterfaceCatalog`]: maps a platform interface token ("eth0") to the
//   human-facing kind ("ETHERNET")
// - [`LinkLocalCheck`]: decides whether an address is link-local
//
// Both are injected into the facade so tests can substitute fakes.
// Default implementations live in [`crate::netutils`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Human-facing interface kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InterfaceKind {
    Ethernet,
    Wifi,
}

impl InterfaceKind {
    /// Wire name of the kind
    pub fn as_str(self) -> &'static str {
        match self {
            InterfaceKind::Ethernet => "ETHERNET",
            InterfaceKind::Wifi => "WIFI",
        }
    }
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsing is exact and case-sensitive: only "ETHERNET" and "WIFI" are kinds.
impl FromStr for InterfaceKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ETHERNET" => Ok(InterfaceKind::Ethernet),
            "WIFI" => Ok(InterfaceKind::Wifi),
            other => Err(crate::Error::invalid_argument(format!(
                "invalid interface [{}]",
                other
            ))),
        }
    }
}

/// Lookup from platform interface token to kind
pub trait InterfaceCatalog: Send + Sync {
    /// Kind of the interface, or `None` for unknown/unsupported tokens
    fn kind_of(&self, token: &str) -> Option<InterfaceKind>;

    /// Human-facing description, empty for unknown tokens
    fn describe(&self, token: &str) -> String {
        self.kind_of(token)
            .map(|kind| kind.as_str().to_string())
            .unwrap_or_default()
    }
}

/// Link-local scope predicate
pub trait LinkLocalCheck: Send + Sync {
    /// Whether a dotted-quad address is IPv4 link-local
    fn is_ipv4_link_local(&self, address: &str) -> bool;

    /// Whether a textual IPv6 address is link-local
    fn is_ipv6_link_local(&self, address: &str) -> bool;
}
