//! Bus availability and event subscription lifecycle
//!
//! ```text
//!            start()                probe ok + subscribe ok
//!   Idle ───────────────▶ Probing ─────────────────────────▶ Subscribed
//!                            │
//!                            │ shutdown() before success
//!                            ▼
//!                         Aborted
//! ```
//!
//! - [`Readiness`]: the one-way ready flag shared with the facade
//! - [`SubscriptionSet`]: all-or-nothing registration of the four event classes
//! - [`AvailabilityMonitor`]: the background probe loop

pub mod monitor;
pub mod readiness;
pub mod subscription;

pub use monitor::{AvailabilityMonitor, MonitorState};
pub use readiness::Readiness;
pub use subscription::SubscriptionSet;
