// Process-wide atomic counters, read by health reporting and shutdown logging.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free server-wide counters updated on the request hot path.
/// `average_latency` is an incremental average stored as f64 bits.
#[derive(Debug, Default)]
pub struct ServerStats {
    total_requests: AtomicU64,
    active_connections: AtomicU64,
    error_count: AtomicU64,
    last_request_unix_ms: AtomicU64,
    average_latency_bits: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatsSnapshot {
    pub total_requests: u64,
    pub active_connections: u64,
    pub error_count: u64,
    pub last_request_unix_ms: u64,
    pub average_latency_ms: f64,
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn active_connections(&self) -> u64 {
        self.active_connections.load(Ordering::Relaxed)
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Records one completed request: count, error count, last-request stamp
    /// and incremental average latency (avg += (d - avg) / n).
    pub fn record_request(&self, duration_ms: f64, is_error: bool, now_unix_ms: u64) {
        let n = self.total_requests.fetch_add(1, Ordering::Relaxed) + 1;
        if is_error {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        self.last_request_unix_ms.store(now_unix_ms, Ordering::Relaxed);
        // n is read separately from the average update, so concurrent
        // requests can apply a stale n; the average is approximate.
        let _ = self
            .average_latency_bits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                let avg = f64::from_bits(bits);
                Some((avg + (duration_ms - avg) / n as f64).to_bits())
            });
    }

    pub fn snapshot(&self) -> ServerStatsSnapshot {
        ServerStatsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            error_count: self.error_count.load(Ordering::Relaxed),
            last_request_unix_ms: self.last_request_unix_ms.load(Ordering::Relaxed),
            average_latency_ms: f64::from_bits(self.average_latency_bits.load(Ordering::Relaxed)),
        }
    }
}
