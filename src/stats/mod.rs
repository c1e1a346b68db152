// Request statistics: per-path aggregates, recent-request ring, request rate.

mod ring;
mod server;

pub use ring::CircularBuffer;
pub use server::{ServerStats, ServerStatsSnapshot};

use crate::models::{PathStats, RequestMetrics};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// EMA smoothing factor for per-path average duration.
const EMA_ALPHA: f64 = 0.1;

/// How many recent requests the ring retains.
pub const RECENT_CAPACITY: usize = 100;

/// Minimum elapsed time before the request rate is recomputed.
pub const RATE_WINDOW: Duration = Duration::from_secs(5);

struct Inner {
    paths: HashMap<String, PathStats>,
    recent: CircularBuffer<RequestMetrics>,
    window_count: u64,
    window_started: Instant,
    current_rate: f64,
}

/// Thread-safe request aggregator. One mutex guards all state; simplicity
/// over throughput, fine at expected QPS.
pub struct RequestStats {
    inner: Mutex<Inner>,
    rate_window: Duration,
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new(RECENT_CAPACITY, RATE_WINDOW)
    }
}

impl RequestStats {
    pub fn new(recent_capacity: usize, rate_window: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                paths: HashMap::new(),
                recent: CircularBuffer::new(recent_capacity),
                window_count: 0,
                window_started: Instant::now(),
                current_rate: 0.0,
            }),
            rate_window,
        }
    }

    /// Records one completed request. Infallible; a poisoned lock is recovered
    /// since all updates keep the state consistent.
    pub fn track(&self, metrics: RequestMetrics) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        {
            let path_stats = inner.paths.entry(metrics.path.clone()).or_default();
            path_stats.total_requests += 1;
            if metrics.status >= 400 {
                path_stats.total_errors += 1;
            }
            // First observation seeds the average exactly, avoiding EMA
            // warm-up bias from a zero start.
            if path_stats.total_requests == 1 {
                path_stats.average_time_ms = metrics.duration_ms;
            } else {
                path_stats.average_time_ms =
                    path_stats.average_time_ms * (1.0 - EMA_ALPHA) + metrics.duration_ms * EMA_ALPHA;
            }
            path_stats.last_access_ms = metrics.timestamp_ms;
            *path_stats.status_codes.entry(metrics.status).or_insert(0) += 1;
        }

        inner.window_count += 1;
        let elapsed = inner.window_started.elapsed();
        if elapsed >= self.rate_window {
            inner.current_rate = inner.window_count as f64 / elapsed.as_secs_f64();
            inner.window_count = 0;
            inner.window_started = Instant::now();
        }

        inner.recent.push(metrics);
    }

    /// Last computed requests/sec, not an instantaneous value.
    pub fn request_rate(&self) -> f64 {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .current_rate
    }

    /// Most recent requests in chronological order, at most the ring capacity.
    pub fn recent_requests(&self) -> Vec<RequestMetrics> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .recent
            .to_vec()
    }

    pub fn path_stats(&self) -> HashMap<String, PathStats> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .paths
            .clone()
    }
}
