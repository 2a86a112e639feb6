//! Static IPv4 configuration validation
//!
//! Rejects manual IP assignments that would leave the device unreachable
//! before they are sent to the network service. Pure and deterministic.
//!
//! Autoconfig requests are never validated; their address fields are
//! advisory. Every manual request must pass the policy gate and the netmask
//! table. IPv6 requests stop there: there is no IPv6 prefix or
//! broadcast-domain check.

use std::net::Ipv4Addr;

use crate::error::Rejection;
use crate::settings::IpSettings;

/// Canonical dotted-quad masks for prefix lengths 1 through 32
///
/// Membership is checked by exact string comparison, so numerically equal
/// spellings such as `255.255.255.000` are rejected.
pub const CIDR_NETMASKS: [&str; 32] = [
    "128.0.0.0",
    "192.0.0.0",
    "224.0.0.0",
    "240.0.0.0",
    "248.0.0.0",
    "252.0.0.0",
    "254.0.0.0",
    "255.0.0.0",
    "255.128.0.0",
    "255.192.0.0",
    "255.224.0.0",
    "255.240.0.0",
    "255.248.0.0",
    "255.252.0.0",
    "255.254.0.0",
    "255.255.0.0",
    "255.255.128.0",
    "255.255.192.0",
    "255.255.224.0",
    "255.255.240.0",
    "255.255.248.0",
    "255.255.252.0",
    "255.255.254.0",
    "255.255.255.0",
    "255.255.255.128",
    "255.255.255.192",
    "255.255.255.224",
    "255.255.255.240",
    "255.255.255.248",
    "255.255.255.252",
    "255.255.255.254",
    "255.255.255.255",
];

/// Whether `mask` is one of the canonical CIDR netmasks
pub fn is_valid_cidr_netmask(mask: &str) -> bool {
    CIDR_NETMASKS.contains(&mask)
}

/// Broadcast address of `addr` under `mask`
pub fn broadcast(addr: Ipv4Addr, mask: Ipv4Addr) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(addr) | !u32::from(mask))
}

/// Validate a proposed IP configuration
///
/// # Parameters
///
/// - `settings`: The requested configuration
/// - `manual_ip_enabled`: Device policy flag permitting static assignment
///
/// # Returns
///
/// - `Ok(())`: The request may be forwarded
/// - `Err(Rejection)`: The first rule the request breaks
pub fn validate(settings: &IpSettings, manual_ip_enabled: bool) -> Result<(), Rejection> {
    if settings.autoconfig {
        return Ok(());
    }

    if !manual_ip_enabled {
        return Err(Rejection::PolicyDisabled);
    }

    if settings.is_ipv6() {
        if !is_valid_cidr_netmask(&settings.netmask) {
            return Err(Rejection::InvalidNetmask);
        }
        return Ok(());
    }

    validate_ipv4(&settings.ipaddr, &settings.netmask, &settings.gateway)
}

/// Validate a static IPv4 address / netmask / gateway triple
pub fn validate_ipv4(ipaddr: &str, netmask: &str, gateway: &str) -> Result<(), Rejection> {
    if !is_valid_cidr_netmask(netmask) {
        return Err(Rejection::InvalidNetmask);
    }

    let (ip, mask, gw) = match (
        ipaddr.parse::<Ipv4Addr>(),
        netmask.parse::<Ipv4Addr>(),
        gateway.parse::<Ipv4Addr>(),
    ) {
        (Ok(ip), Ok(mask), Ok(gw)) => (ip, mask, gw),
        _ => return Err(Rejection::InvalidAddress),
    };

    let ip_broadcast = broadcast(ip, mask);
    let gw_broadcast = broadcast(gw, mask);

    if ip == gw {
        return Err(Rejection::AddressCollision);
    }

    if ip_broadcast != gw_broadcast {
        return Err(Rejection::SubnetMismatch);
    }

    if ip == ip_broadcast || gw == gw_broadcast {
        return Err(Rejection::AddressCollision);
    }

    Ok(())
}
