// # Diagnostics Trait
//
// Trace and ping are passthroughs to platform tooling. The facade only gates
// them on readiness and fills in default packet counts; the result shape is
// whatever the runner reports.

use async_trait::async_trait;

/// Trait for trace/ping runners
#[async_trait]
pub trait Diagnostics: Send + Sync {
    /// Trace the route to an endpoint
    async fn trace(&self, endpoint: &str, packets: u32)
    -> Result<serde_json::Value, crate::Error>;

    /// Trace the route to a named endpoint (see `getNamedEndpoints`)
    async fn trace_named_endpoint(
        &self,
        endpoint_name: &str,
        packets: u32,
    ) -> Result<serde_json::Value, crate::Error>;

    /// Ping an endpoint; the report carries a boolean `success` field
    async fn ping(
        &self,
        guid: &str,
        endpoint: &str,
        packets: u32,
    ) -> Result<serde_json::Value, crate::Error>;

    /// Ping a named endpoint; the report carries a boolean `success` field
    async fn ping_named_endpoint(
        &self,
        guid: &str,
        endpoint_name: &str,
        packets: u32,
    ) -> Result<serde_json::Value, crate::Error>;
}
