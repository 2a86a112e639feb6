// # Manual IP Policy Trait
//
// Whether static IP assignment is allowed on this device is a remote feature
// flag. It is read at the time of each `setIPSettings` request.

/// Source of the manual-IP feature flag
pub trait ManualIpPolicy: Send + Sync {
    /// Whether manual (non-autoconfig) IP settings are permitted
    fn manual_ip_enabled(&self) -> bool;
}

/// Fixed policy value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticPolicy(pub bool);

impl ManualIpPolicy for StaticPolicy {
    fn manual_ip_enabled(&self) -> bool {
        self.0
    }
}
