// Single-slot TTL read-through cache over a system collector.
// Concurrent health checks inside the TTL window share one snapshot instead
// of re-querying the OS; refresh is single-flight via the write lock.

use crate::errors::MonitoringError;
use crate::models::SystemStats;
use crate::monitoring::SystemCollector;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Default refresh interval for cached system stats.
pub const DEFAULT_TTL: Duration = Duration::from_secs(2);

#[derive(Default)]
struct Slot {
    snapshot: Option<Arc<SystemStats>>,
    collected_at: Option<Instant>,
}

impl Slot {
    fn fresh(&self, ttl: Duration) -> Option<Arc<SystemStats>> {
        match (&self.snapshot, self.collected_at) {
            (Some(snapshot), Some(at)) if at.elapsed() < ttl => Some(snapshot.clone()),
            _ => None,
        }
    }
}

pub struct StatsCache {
    collector: Arc<dyn SystemCollector>,
    ttl: Duration,
    slot: RwLock<Slot>,
}

impl StatsCache {
    pub fn new(collector: Arc<dyn SystemCollector>, ttl: Duration) -> Self {
        Self {
            collector,
            ttl,
            slot: RwLock::new(Slot::default()),
        }
    }

    /// Returns the cached snapshot when fresh (shared lock only), otherwise
    /// refreshes under the exclusive lock with a double-checked TTL so a
    /// thundering herd performs exactly one physical collection. Cancellation
    /// aborts the refresh and leaves the slot untouched.
    pub async fn get(
        &self,
        cancel: &tokio_util::sync::CancellationToken,
    ) -> Result<Arc<SystemStats>, MonitoringError> {
        {
            let slot = self.slot.read().await;
            if let Some(snapshot) = slot.fresh(self.ttl) {
                return Ok(snapshot);
            }
        }

        let mut slot = self.slot.write().await;
        // Another caller may have refreshed while we waited for the lock.
        if let Some(snapshot) = slot.fresh(self.ttl) {
            return Ok(snapshot);
        }

        if cancel.is_cancelled() {
            return Err(MonitoringError::Cancelled {
                operation: "collect",
            });
        }

        let snapshot = Arc::new(self.collector.collect(cancel).await?);
        slot.snapshot = Some(snapshot.clone());
        slot.collected_at = Some(Instant::now());
        Ok(snapshot)
    }

    /// Age of the cached snapshot, if any.
    pub async fn last_collected(&self) -> Option<Duration> {
        self.slot.read().await.collected_at.map(|at| at.elapsed())
    }
}
