//! IP settings request and report shapes
//!
//! Two request shapes exist: v1 requires every field, v2 fills omitted
//! fields with defaults (autoconfig on, primary DNS `0.0.0.0`). Both decode
//! into [`IpSettings`], which is what the validator and the bus see.

use serde::{Deserialize, Serialize};

/// A complete IP settings request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpSettings {
    pub interface: String,
    pub ipversion: String,
    pub autoconfig: bool,
    pub ipaddr: String,
    pub netmask: String,
    pub gateway: String,
    pub primarydns: String,
    pub secondarydns: String,
}

impl IpSettings {
    /// Decode v1 parameters; every field must be present
    pub fn from_v1_params(params: &serde_json::Value) -> Result<Self, crate::Error> {
        serde_json::from_value(params.clone())
            .map_err(|e| crate::Error::invalid_argument(format!("setIPSettings: {}", e)))
    }

    /// Decode v2 parameters, filling defaults for omitted fields
    pub fn from_v2_params(params: &serde_json::Value) -> Result<Self, crate::Error> {
        let params: IpSettingsParams = serde_json::from_value(params.clone())
            .map_err(|e| crate::Error::invalid_argument(format!("setIPSettings: {}", e)))?;
        Ok(params.into())
    }

    /// Whether this request targets IPv6
    pub fn is_ipv6(&self) -> bool {
        self.ipversion.eq_ignore_ascii_case("IPv6")
    }
}

/// v2 request shape with defaulted fields
#[derive(Debug, Clone, Deserialize)]
pub struct IpSettingsParams {
    #[serde(default)]
    pub interface: String,
    #[serde(default)]
    pub ipversion: String,
    #[serde(default = "default_autoconfig")]
    pub autoconfig: bool,
    #[serde(default)]
    pub ipaddr: String,
    #[serde(default)]
    pub netmask: String,
    #[serde(default)]
    pub gateway: String,
    #[serde(default = "default_primary_dns")]
    pub primarydns: String,
    #[serde(default)]
    pub secondarydns: String,
}

impl From<IpSettingsParams> for IpSettings {
    fn from(params: IpSettingsParams) -> Self {
        Self {
            interface: params.interface,
            ipversion: params.ipversion,
            autoconfig: params.autoconfig,
            ipaddr: params.ipaddr,
            netmask: params.netmask,
            gateway: params.gateway,
            primarydns: params.primarydns,
            secondarydns: params.secondarydns,
        }
    }
}

fn default_autoconfig() -> bool {
    true
}

fn default_primary_dns() -> String {
    "0.0.0.0".to_string()
}

/// Address acquisition state reported alongside IP settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionStatus {
    /// Address acquired; the report is complete
    Acquired,
    /// Autoconfig is on but no address has been obtained yet
    NotFound,
    NoRouteInterface,
    NoDefaultRoute,
    DnsNotConfigured,
    InvalidAddress,
}

/// IP settings as reported by the network service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpSettingsReport {
    pub interface: String,
    pub ipversion: String,
    pub autoconfig: bool,
    pub ipaddr: String,
    pub netmask: String,
    pub gateway: String,
    pub dhcpserver: String,
    pub primarydns: String,
    pub secondarydns: String,
    pub status: AcquisitionStatus,
}

/// IP settings as returned to callers
///
/// Absent fields are omitted from the serialized response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpSettingsView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipversion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoconfig: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcpserver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipaddr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primarydns: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondarydns: Option<String>,
}

impl IpSettingsView {
    /// v1 view: the full record, only once the address is acquired
    pub fn v1(report: &IpSettingsReport) -> Option<Self> {
        if report.status != AcquisitionStatus::Acquired {
            return None;
        }

        Some(Self {
            interface: Some(report.interface.clone()),
            ipversion: Some(report.ipversion.clone()),
            autoconfig: Some(report.autoconfig),
            dhcpserver: None,
            ipaddr: Some(report.ipaddr.clone()),
            netmask: Some(report.netmask.clone()),
            gateway: Some(report.gateway.clone()),
            primarydns: Some(report.primarydns.clone()),
            secondarydns: Some(report.secondarydns.clone()),
        })
    }

    /// v2 view
    ///
    /// While acquisition is pending only `interface` and `autoconfig` are
    /// returned. `dhcpserver` is returned only when autoconfig renders as
    /// "true" and the version is "IPv4" (both compared case-insensitively);
    /// `secondarydns` only when set.
    pub fn v2(report: &IpSettingsReport) -> Option<Self> {
        match report.status {
            AcquisitionStatus::NotFound => Some(Self {
                interface: Some(report.interface.clone()),
                autoconfig: Some(report.autoconfig),
                ..Self::default()
            }),
            AcquisitionStatus::Acquired => {
                let autoconfig = report.autoconfig.to_string();
                let dhcpserver = (autoconfig.eq_ignore_ascii_case("true")
                    && report.ipversion.eq_ignore_ascii_case("IPv4"))
                .then(|| report.dhcpserver.clone());
                let secondarydns =
                    (!report.secondarydns.is_empty()).then(|| report.secondarydns.clone());

                Some(Self {
                    interface: Some(report.interface.clone()),
                    ipversion: Some(report.ipversion.clone()),
                    autoconfig: Some(report.autoconfig),
                    dhcpserver,
                    ipaddr: Some(report.ipaddr.clone()),
                    netmask: Some(report.netmask.clone()),
                    gateway: Some(report.gateway.clone()),
                    primarydns: Some(report.primarydns.clone()),
                    secondarydns,
                })
            }
            _ => None,
        }
    }
}
