// # netsrv-core
//
// Core library for the network interface facade.
//
// ## Architecture Overview
//
// This library sits between callers and the platform network service:
// - **BusClient**: Trait for calls and event registration against the network service
// - **ConfigValidator**: Static IPv4 checks run before settings reach the bus
// - **RouteResolver**: Default route via the bus or via parsed routing tables
// - **AvailabilityMonitor**: Background probe that subscribes once the service answers
// - **EventTranslator**: Raw bus events to typed notifications
// - **NetworkFacade**: Readiness-gated request surface composing all of the above
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from platform adapters
// 2. **Event-Driven**: Notifications are delivered on an async stream
// 3. **Fail Closed**: Nothing reaches the bus before the subscription is up
// 4. **Library-First**: The transport and the host process live outside this crate

pub mod traits;
pub mod config;
pub mod error;
pub mod events;
pub mod facade;
pub mod lifecycle;
pub mod netutils;
pub mod route;
pub mod settings;
pub mod validator;

// Re-export core types for convenience
pub use traits::{BusClient, Diagnostics, InterfaceCatalog, LinkLocalCheck, ManualIpPolicy, RouteTextSource};
pub use facade::{Collaborators, NetworkFacade, NotificationStream};
pub use config::{DeviceMode, EventPolicy, NetworkConfig, StunConfig};
pub use error::{Error, Rejection, Result};
pub use events::{EventTranslator, Notification};
pub use lifecycle::{AvailabilityMonitor, MonitorState};
pub use netutils::{StaticInterfaceCatalog, StdLinkLocal};
pub use route::RouteResolver;
pub use settings::{IpSettings, IpSettingsView};
