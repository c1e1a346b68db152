// Health check and request-statistics endpoints.

use axum::extract::State;
use axum::response::IntoResponse;
use tokio_util::sync::CancellationToken;

use crate::context::AppContext;
use crate::errors::ServerError;

/// GET /api/health — server counters plus the cached system snapshot.
/// Collection is bounded by the configured timeout; a slow or failing
/// collector degrades to `system_stats: null` rather than failing the check.
pub(super) async fn health_handler(
    State(ctx): State<AppContext>,
) -> Result<impl IntoResponse, ServerError> {
    let cancel = CancellationToken::new();
    let timeout = ctx.config.monitoring.collect_timeout();
    // Collection runs in its own task: on timeout the token is cancelled and
    // the still-running refresh stops at its next checkpoint, leaving the
    // cache slot untouched, instead of being dropped mid-collection.
    let collect = {
        let cache = ctx.stats_cache.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { cache.get(&cancel).await })
    };
    let system_stats = match tokio::time::timeout(timeout, collect).await {
        Ok(Ok(Ok(stats))) => Some(stats),
        Ok(Ok(Err(e))) => {
            if e.is_cancelled() {
                return Err(e.into());
            }
            tracing::warn!(error = %e, operation = "health_check", "system stats unavailable");
            None
        }
        Ok(Err(join_err)) => {
            tracing::warn!(error = %join_err, operation = "health_check", "collection task failed");
            None
        }
        Err(_) => {
            cancel.cancel();
            tracing::warn!(
                timeout_ms = timeout.as_millis() as u64,
                operation = "health_check",
                "system stats collection timed out"
            );
            None
        }
    };

    Ok(axum::Json(serde_json::json!({
        "status": "ok",
        "server_stats": ctx.server_stats.snapshot(),
        "system_stats": system_stats.as_deref(),
        "last_check_time": chrono::Utc::now().to_rfc3339(),
    })))
}

/// GET /api/stats/requests — aggregator view: rate, recent ring, per-path stats.
pub(super) async fn request_stats_handler(State(ctx): State<AppContext>) -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "request_rate": ctx.request_stats.request_rate(),
        "recent_requests": ctx.request_stats.recent_requests(),
        "paths": ctx.request_stats.path_stats(),
    }))
}
