// Stats cache tests: TTL hit path, expiry, cancellation, single-flight refresh

mod common;

use appserver::monitoring::StatsCache;
use common::CountingCollector;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_hit_within_ttl_returns_same_snapshot_without_collecting() {
    let collector = CountingCollector::new();
    let cache = StatsCache::new(collector.clone(), Duration::from_secs(60));
    let cancel = CancellationToken::new();

    let first = cache.get(&cancel).await.unwrap();
    let second = cache.get(&cancel).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(collector.call_count(), 1);
    assert_eq!(first.hostname, "test-host");
}

#[tokio::test]
async fn test_expired_ttl_triggers_fresh_collection() {
    let collector = CountingCollector::new();
    let cache = StatsCache::new(collector.clone(), Duration::from_millis(30));
    let cancel = CancellationToken::new();

    let _ = cache.get(&cancel).await.unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;
    let _ = cache.get(&cancel).await.unwrap();

    assert_eq!(collector.call_count(), 2);
}

#[tokio::test]
async fn test_cancellation_before_refresh_leaves_cache_unmodified() {
    let collector = CountingCollector::new();
    let cache = StatsCache::new(collector.clone(), Duration::from_secs(60));

    let cancelled = CancellationToken::new();
    cancelled.cancel();
    let err = cache.get(&cancelled).await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(collector.call_count(), 0);
    assert!(cache.last_collected().await.is_none());

    // A later caller with a live token still gets a fresh snapshot.
    let cancel = CancellationToken::new();
    let stats = cache.get(&cancel).await.unwrap();
    assert_eq!(stats.hostname, "test-host");
    assert_eq!(collector.call_count(), 1);
}

#[tokio::test]
async fn test_concurrent_misses_collect_exactly_once() {
    let collector = CountingCollector::new();
    let cache = Arc::new(StatsCache::new(collector.clone(), Duration::from_secs(60)));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move {
                let cancel = CancellationToken::new();
                cache.get(&cancel).await.unwrap()
            })
        })
        .collect();

    let mut snapshots = Vec::new();
    for handle in handles {
        snapshots.push(handle.await.unwrap());
    }

    assert_eq!(collector.call_count(), 1);
    for snapshot in &snapshots[1..] {
        assert!(Arc::ptr_eq(&snapshots[0], snapshot));
    }
}

#[tokio::test]
async fn test_last_collected_tracks_refresh_age() {
    let collector = CountingCollector::new();
    let cache = StatsCache::new(collector, Duration::from_secs(60));
    assert!(cache.last_collected().await.is_none());

    let cancel = CancellationToken::new();
    let _ = cache.get(&cancel).await.unwrap();
    let age = cache.last_collected().await.unwrap();
    assert!(age < Duration::from_secs(5));
}
