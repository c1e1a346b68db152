// Shared test helpers

use appserver::config::AppConfig;
use appserver::context::AppContext;
use appserver::errors::MonitoringError;
use appserver::models::SystemStats;
use appserver::monitoring::SystemCollector;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

pub const TEST_CONFIG: &str = r#"
[server]
port = 8091
host = "127.0.0.1"

[monitoring]
cache_ttl_ms = 2000
collect_timeout_ms = 1000

[stats]
recent_capacity = 100
rate_window_secs = 5

[jobs]
enabled = false
"#;

pub fn test_app_config() -> AppConfig {
    AppConfig::load_from_str(TEST_CONFIG).unwrap()
}

/// Fake collector counting physical collection passes; returns a canned
/// snapshot so call counts and snapshot identity can be asserted.
pub struct CountingCollector {
    pub calls: AtomicUsize,
}

impl CountingCollector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SystemCollector for CountingCollector {
    async fn collect(&self, cancel: &CancellationToken) -> Result<SystemStats, MonitoringError> {
        if cancel.is_cancelled() {
            return Err(MonitoringError::Cancelled {
                operation: "collect",
            });
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SystemStats {
            hostname: "test-host".into(),
            platform: "TestOS".into(),
            ..Default::default()
        })
    }
}

pub fn test_context(collector: Arc<dyn SystemCollector>) -> AppContext {
    AppContext::with_collector(test_app_config(), collector, Instant::now())
}
