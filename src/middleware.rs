// Request logging, panic recovery and error translation.
// Wraps every route: assigns a trace ID, times the request, catches panics,
// rewrites structured error bodies with the trace ID, and feeds the
// request-statistics aggregator and the server-wide counters.

use crate::context::AppContext;
use crate::errors::ErrorPayload;
use crate::models::RequestMetrics;
use crate::stats::ServerStats;
use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderValue, Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;
use std::any::Any;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Header carrying the per-request trace identifier, inbound and in the
/// response.
pub const TRACE_HEADER: &str = "x-trace-id";

/// Trace ID made available to handlers via request extensions.
#[derive(Debug, Clone)]
pub struct TraceId(pub String);

/// Decrements the active-connection gauge on drop, so the count stays
/// balanced even when the handler panics.
struct ConnectionGuard(Arc<ServerStats>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.connection_closed();
    }
}

pub async fn track_requests(
    State(ctx): State<AppContext>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let trace_id = req
        .headers()
        .get(TRACE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        req.headers_mut().insert(TRACE_HEADER, value);
    }
    req.extensions_mut().insert(TraceId(trace_id.clone()));

    let path = req.uri().path().to_string();
    let method = req.method().to_string();
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let content_length = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|c| c.0.to_string())
        .unwrap_or_default();

    ctx.server_stats.connection_opened();
    let _guard = ConnectionGuard(ctx.server_stats.clone());
    let started = Instant::now();

    let mut response = match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            tracing::error!(
                trace_id = %trace_id,
                method = %method,
                path = %path,
                panic = %panic_message(panic.as_ref()),
                backtrace = %std::backtrace::Backtrace::force_capture(),
                "handler panicked"
            );
            panic_response(&trace_id)
        }
    };

    // Structured errors stash their payload in the response extensions;
    // rewrite the body with the real trace ID here, the single translation
    // point for error responses.
    if let Some(mut payload) = response.extensions_mut().remove::<ErrorPayload>() {
        payload.trace_id = trace_id.clone();
        tracing::warn!(
            trace_id = %trace_id,
            kind = %payload.kind,
            operation = %payload.operation,
            "request failed: {}",
            payload.message
        );
        let status = response.status();
        response = (status, axum::Json(payload)).into_response();
    }

    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
    let status = response.status().as_u16();
    let now_ms = chrono::Utc::now().timestamp_millis() as u64;
    ctx.server_stats
        .record_request(duration_ms, status >= 400, now_ms);
    ctx.request_stats.track(RequestMetrics {
        path: path.clone(),
        method: method.clone(),
        status,
        duration_ms,
        timestamp_ms: now_ms,
        user_agent,
        content_length,
        remote_addr,
    });

    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert(TRACE_HEADER, value);
    }
    tracing::info!(
        method = %method,
        path = %path,
        status,
        duration_ms,
        trace_id = %trace_id,
        "request completed"
    );
    response
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Generic 500 body for recovered panics; the panic detail stays server-side.
fn panic_response(trace_id: &str) -> Response {
    let payload = ErrorPayload {
        status: "error".into(),
        message: "internal server error".into(),
        kind: "panic".into(),
        operation: "handler".into(),
        status_code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        trace_id: trace_id.to_string(),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
}
