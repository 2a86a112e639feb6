//! Capability traits for the network facade
//!
//! This module defines the seams between the core and the platform.
//!
//! - [`BusClient`]: Calls and event registration against the network service
//! - [`InterfaceCatalog`] / [`LinkLocalCheck`]: Interface-name and scope lookups
//! - [`RouteTextSource`]: Raw routing tables for the parsed route strategy
//! - [`Diagnostics`]: Trace/ping passthroughs
//! - [`ManualIpPolicy`]: Feature flag gating static IP assignment

pub mod bus_client;
pub mod diagnostics;
pub mod interface_catalog;
pub mod policy;
pub mod route_text;

pub use bus_client::{
    BusClient, DefaultRoute, EventClass, NETWORK_SERVICE_OWNER, RawInterface, StunRequest,
};
pub use diagnostics::Diagnostics;
pub use interface_catalog::{InterfaceCatalog, InterfaceKind, LinkLocalCheck};
pub use policy::{ManualIpPolicy, StaticPolicy};
pub use route_text::RouteTextSource;
