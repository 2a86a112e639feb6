// # Route Text Source Trait
//
// Supplies raw routing-table text for the parsed default-route strategy used
// on hybrid devices. How the text is produced (running `ip`/`route`, reading
// procfs, a canned fixture) is up to the implementation.
//
// ## Implementations
//
// - Command-based (Linux): `netsrv-platform` crate
// - Fixtures in tests

use async_trait::async_trait;

/// Trait for routing-table text sources
#[async_trait]
pub trait RouteTextSource: Send + Sync {
    /// IPv6 default-route line(s), e.g. `default via fe80::1 dev eth0 metric 1024`
    ///
    /// An empty string means no IPv6 default route exists.
    async fn ipv6_default_route(&self) -> Result<String, crate::Error>;

    /// IPv4 routing table in `route -n` layout
    async fn ipv4_route_table(&self) -> Result<String, crate::Error>;
}
