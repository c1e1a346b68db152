// HTTP routes

mod demo;
mod health;

pub use demo::{CreatePost, DemoStore, Post, UpdatePost};

use axum::{Router, routing::get};
use tower_http::cors::{Any, CorsLayer};

use crate::context::AppContext;
use crate::middleware;
use crate::version::{NAME, VERSION};

/// GET /version — returns service name and version (from Cargo.toml at build time).
async fn version_handler() -> impl axum::response::IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

pub fn app(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(|| async { "appserver is running" })) // GET /
        .route("/version", get(version_handler)) // GET /version
        .route("/api/health", get(health::health_handler)) // GET /api/health
        .route("/api/stats/requests", get(health::request_stats_handler)) // GET /api/stats/requests
        .route(
            "/api/demo/posts",
            get(demo::list_posts).post(demo::create_post),
        )
        .route(
            "/api/demo/posts/{id}",
            get(demo::get_post)
                .patch(demo::update_post)
                .put(demo::replace_post)
                .delete(demo::delete_post),
        )
        .layer(axum::middleware::from_fn_with_state(
            ctx.clone(),
            middleware::track_requests,
        ))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(ctx)
}
