use anyhow::Result;
use appserver::*;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

fn register_jobs(manager: &mut jobs::JobManager, ctx: &context::AppContext) -> Result<()> {
    let heartbeat_ctx = ctx.clone();
    manager.register(
        "heartbeat",
        "Periodic liveness report",
        "*/1 * * * *",
        move |logger| {
            let ctx = heartbeat_ctx.clone();
            async move {
                logger.progress("checking server counters");
                let stats = ctx.server_stats.snapshot();
                logger.statistics(&[
                    ("total_requests", stats.total_requests.to_string()),
                    ("active_connections", stats.active_connections.to_string()),
                    ("error_count", stats.error_count.to_string()),
                ]);
                Ok(format!(
                    "heartbeat ok, {} requests served",
                    stats.total_requests
                ))
            }
        },
    )?;

    let report_ctx = ctx.clone();
    manager.register(
        "stats-report",
        "Request statistics summary",
        "*/5 * * * *",
        move |logger| {
            let ctx = report_ctx.clone();
            async move {
                logger.progress("aggregating request statistics");
                let rate = ctx.request_stats.request_rate();
                let paths = ctx.request_stats.path_stats();
                logger.statistics(&[
                    ("request_rate", format!("{rate:.3}")),
                    ("distinct_paths", paths.len().to_string()),
                ]);
                Ok(format!("reported {} paths", paths.len()))
            }
        },
    )?;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    let ctx = context::AppContext::new(app_config.clone());

    let mut manager = jobs::JobManager::new();
    if app_config.jobs.enabled {
        register_jobs(&mut manager, &ctx)?;
    }
    let manager = Arc::new(manager);
    let jobs_shutdown = CancellationToken::new();
    let job_handles = manager.spawn(jobs_shutdown.clone());

    let app = routes::app(ctx.clone());
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Some(domain) = &app_config.server.domain {
        tracing::info!(domain, "serving behind domain");
    }
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        ) => {
            result?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
        }
    }

    jobs_shutdown.cancel();
    for handle in job_handles {
        let _ = handle.await;
    }

    let stats = ctx.server_stats.snapshot();
    tracing::info!(
        total_requests = stats.total_requests,
        error_count = stats.error_count,
        average_latency_ms = stats.average_latency_ms,
        "server stopped"
    );
    Ok(())
}
