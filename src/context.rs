// Application context: explicitly constructed at process start and passed to
// every component, instead of package-level singletons.

use crate::config::AppConfig;
use crate::monitoring::{StatsCache, SysinfoCollector, SystemCollector};
use crate::routes::DemoStore;
use crate::stats::{RequestStats, ServerStats};
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub server_stats: Arc<ServerStats>,
    pub request_stats: Arc<RequestStats>,
    pub stats_cache: Arc<StatsCache>,
    pub demo_store: Arc<DemoStore>,
    pub started_at: Instant,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Self {
        let started_at = Instant::now();
        let collector = Arc::new(SysinfoCollector::new(started_at));
        Self::with_collector(config, collector, started_at)
    }

    /// Context with a substituted collector, used by tests with fakes.
    pub fn with_collector(
        config: AppConfig,
        collector: Arc<dyn SystemCollector>,
        started_at: Instant,
    ) -> Self {
        let stats_cache = Arc::new(StatsCache::new(collector, config.monitoring.cache_ttl()));
        let request_stats = Arc::new(RequestStats::new(
            config.stats.recent_capacity,
            config.stats.rate_window(),
        ));
        Self {
            config,
            server_stats: Arc::new(ServerStats::new()),
            request_stats,
            stats_cache,
            demo_store: Arc::new(DemoStore::default()),
            started_at,
        }
    }
}
