// Per-request record and per-path running aggregate

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One record per completed HTTP request, built by the logging middleware and
/// fed to the request-statistics aggregator. Not persisted beyond the
/// recent-requests ring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetrics {
    pub path: String,
    pub method: String,
    pub status: u16,
    pub duration_ms: f64,
    pub timestamp_ms: u64,
    pub user_agent: String,
    pub content_length: u64,
    pub remote_addr: String,
}

/// Running aggregate for one distinct path. Created lazily on first
/// observation; lives for the process lifetime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStats {
    pub total_requests: u64,
    pub total_errors: u64,
    /// Exponential moving average of request duration (ms).
    pub average_time_ms: f64,
    pub last_access_ms: u64,
    pub status_codes: HashMap<u16, u64>,
}
