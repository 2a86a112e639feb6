//! Error types for the network facade
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for facade operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the network facade
///
/// Nothing in this crate is fatal to the process: every variant degrades to a
/// boolean-false or empty response at the RPC boundary.
#[derive(Error, Debug)]
pub enum Error {
    /// The facade has not subscribed to the network service yet
    #[error("Not ready: {0}")]
    NotReady(String),

    /// Malformed, missing or out-of-range request field
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Static IPv4 configuration rejected before reaching the service
    #[error("Validation rejected: {0}")]
    ValidationRejected(#[from] Rejection),

    /// The network service call failed or timed out
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Malformed or unrecognized bus event
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local I/O errors (command execution, property files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Reason a static IPv4 configuration was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Manual IP settings are disabled by device policy
    #[error("manual IP settings are not enabled")]
    PolicyDisabled,

    /// Netmask is not one of the canonical CIDR masks
    #[error("netmask is not a valid CIDR mask")]
    InvalidNetmask,

    /// Address, netmask or gateway is not a dotted-quad IPv4 address
    #[error("address is not a valid IPv4 address")]
    InvalidAddress,

    /// Address equals the gateway or a broadcast address
    #[error("address collides with gateway or broadcast address")]
    AddressCollision,

    /// Address and gateway are in different broadcast domains
    #[error("address and gateway are not in the same broadcast domain")]
    SubnetMismatch,
}

impl Error {
    /// Create a "not ready" error
    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::NotReady(msg.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an upstream error
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(msg.into())
    }

    /// Create an unknown event error
    pub fn unknown_event(msg: impl Into<String>) -> Self {
        Self::UnknownEvent(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the caller may simply retry later
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady(_))
    }

    /// The validator reason, if this is a validation rejection
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::ValidationRejected(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
