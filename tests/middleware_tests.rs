// Middleware tests: trace IDs, panic recovery, error translation, counters

mod common;

use appserver::context::AppContext;
use appserver::errors::ServerError;
use appserver::middleware::{self, TRACE_HEADER};
use axum::{Router, routing::get};
use axum_test::TestServer;
use common::{CountingCollector, test_context};

async fn ok_handler() -> &'static str {
    "ok"
}

async fn boom_handler() -> &'static str {
    panic!("boom")
}

async fn denied_handler() -> Result<&'static str, ServerError> {
    Err(ServerError::Auth {
        operation: "login".into(),
        message: "invalid token".into(),
    })
}

fn test_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/ok", get(ok_handler))
        .route("/boom", get(boom_handler))
        .route("/denied", get(denied_handler))
        .layer(axum::middleware::from_fn_with_state(
            ctx.clone(),
            middleware::track_requests,
        ))
        .with_state(ctx)
}

fn test_server() -> (TestServer, AppContext) {
    let ctx = test_context(CountingCollector::new());
    let server = TestServer::new(test_router(ctx.clone()));
    (server, ctx)
}

#[tokio::test]
async fn test_every_response_carries_a_trace_id() {
    let (server, _ctx) = test_server();
    let response = server.get("/ok").await;
    response.assert_status_ok();
    let trace_id = response.header(TRACE_HEADER);
    assert!(!trace_id.to_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_inbound_trace_id_is_echoed() {
    let (server, _ctx) = test_server();
    let response = server.get("/ok").add_header(TRACE_HEADER, "abc-123").await;
    response.assert_status_ok();
    assert_eq!(
        response.header(TRACE_HEADER).to_str().unwrap(),
        "abc-123"
    );
}

#[tokio::test]
async fn test_panic_becomes_500_json_with_matching_trace_id() {
    let (server, _ctx) = test_server();
    let response = server.get("/boom").await;
    response.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value = response.json();
    assert_eq!(body["type"], "panic");
    assert_eq!(body["status"], "error");
    assert_eq!(body["status_code"], 500);

    let header_trace = response.header(TRACE_HEADER).to_str().unwrap().to_string();
    assert_eq!(body["trace_id"], header_trace);

    // Process (and server) survive the panic.
    let response = server.get("/ok").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_structured_error_translated_to_canonical_body() {
    let (server, _ctx) = test_server();
    let response = server.get("/denied").await;
    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "error");
    assert_eq!(body["type"], "auth");
    assert_eq!(body["operation"], "login");
    assert_eq!(body["message"], "invalid token");
    assert_eq!(body["status_code"], 401);
    assert!(!body["trace_id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_counters_and_aggregator_updated_per_request() {
    let (server, ctx) = test_server();
    server.get("/ok").await.assert_status_ok();
    let _ = server.get("/denied").await;

    let snapshot = ctx.server_stats.snapshot();
    assert_eq!(snapshot.total_requests, 2);
    assert_eq!(snapshot.error_count, 1);
    assert_eq!(snapshot.active_connections, 0);
    assert!(snapshot.average_latency_ms >= 0.0);

    let paths = ctx.request_stats.path_stats();
    assert_eq!(paths["/ok"].total_requests, 1);
    assert_eq!(paths["/denied"].total_errors, 1);
    assert_eq!(paths["/denied"].status_codes[&401], 1);

    let recent = ctx.request_stats.recent_requests();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].path, "/ok");
    assert_eq!(recent[1].path, "/denied");
}

#[tokio::test]
async fn test_panicking_request_still_recorded_in_stats() {
    let (server, ctx) = test_server();
    let _ = server.get("/boom").await;
    let paths = ctx.request_stats.path_stats();
    assert_eq!(paths["/boom"].total_requests, 1);
    assert_eq!(paths["/boom"].total_errors, 1);
    assert_eq!(ctx.server_stats.snapshot().active_connections, 0);
}
