//! Response types for the relayer API.

use serde::Serialize;

/// Response from the health endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub relayer: String,
    pub relay_hub: String,
    pub uptime_secs: u64,
    pub requests: u64,
}
