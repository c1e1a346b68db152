// Demo CRUD collection backed by an in-process map. Stands in for
// framework-owned record persistence; resets on restart.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::context::AppContext;
use crate::errors::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: String,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePost {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub author: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePost {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Default)]
pub struct DemoStore {
    posts: RwLock<HashMap<String, Post>>,
}

impl DemoStore {
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Post>> {
        self.posts.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Post>> {
        self.posts.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}

fn not_found(id: &str) -> ServerError {
    ServerError::not_found("demo_posts", format!("post {id} not found"))
}

/// GET /api/demo/posts
pub(super) async fn list_posts(State(ctx): State<AppContext>) -> impl IntoResponse {
    let mut items: Vec<Post> = ctx.demo_store.read().values().cloned().collect();
    items.sort_by_key(|p| (p.created_at_ms, p.id.clone()));
    let total = items.len();
    axum::Json(serde_json::json!({ "items": items, "total": total }))
}

/// POST /api/demo/posts
pub(super) async fn create_post(
    State(ctx): State<AppContext>,
    axum::Json(body): axum::Json<CreatePost>,
) -> impl IntoResponse {
    let now = now_ms();
    let post = Post {
        id: Uuid::new_v4().to_string(),
        title: body.title,
        content: body.content,
        author: body.author,
        created_at_ms: now,
        updated_at_ms: now,
    };
    ctx.demo_store.write().insert(post.id.clone(), post.clone());
    (StatusCode::CREATED, axum::Json(post))
}

/// GET /api/demo/posts/{id}
pub(super) async fn get_post(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let post = ctx.demo_store.read().get(&id).cloned().ok_or_else(|| not_found(&id))?;
    Ok(axum::Json(post))
}

/// PATCH /api/demo/posts/{id} — partial update.
pub(super) async fn update_post(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    axum::Json(body): axum::Json<UpdatePost>,
) -> Result<impl IntoResponse, ServerError> {
    let mut posts = ctx.demo_store.write();
    let post = posts.get_mut(&id).ok_or_else(|| not_found(&id))?;
    if let Some(title) = body.title {
        post.title = title;
    }
    if let Some(content) = body.content {
        post.content = content;
    }
    if let Some(author) = body.author {
        post.author = author;
    }
    post.updated_at_ms = now_ms();
    Ok(axum::Json(post.clone()))
}

/// PUT /api/demo/posts/{id} — full replace, id and creation time preserved.
pub(super) async fn replace_post(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    axum::Json(body): axum::Json<CreatePost>,
) -> Result<impl IntoResponse, ServerError> {
    let mut posts = ctx.demo_store.write();
    let post = posts.get_mut(&id).ok_or_else(|| not_found(&id))?;
    post.title = body.title;
    post.content = body.content;
    post.author = body.author;
    post.updated_at_ms = now_ms();
    Ok(axum::Json(post.clone()))
}

/// DELETE /api/demo/posts/{id}
pub(super) async fn delete_post(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    ctx.demo_store.write().remove(&id).ok_or_else(|| not_found(&id))?;
    Ok(axum::Json(serde_json::json!({ "status": "deleted", "id": id })))
}
