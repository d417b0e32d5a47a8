//! Routing table (§4.1, longest-prefix match):
//!
//! | Path prefix | Target | Rewrite |
//! |---|---|---|
//! | `/health` | local | — |
//! | `/api-docs*` | local static | — |
//! | `/api/auth/*` | Identity | strip `/api/auth`, prepend `/auth` |
//! | `/api/chat/*` | Chat Engine | strip `/api/chat` |
//! | `/api/video/*` | Video Engine | strip `/api/video` |
//!
//! An upgrade request that hits neither chat nor video prefix (the bare
//! duplex default path) falls back to the Chat Engine.

use axum::{
    body::Body,
    extract::{OriginalUri, State},
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;

use crate::error::GatewayError;
use crate::proxy;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api-docs", get(api_docs_index))
        .route("/api-docs/{backend}", get(api_docs_backend))
        .route("/api/auth/{*rest}", any(proxy_auth))
        .route("/api/auth", any(proxy_auth))
        .route("/api/chat/{*rest}", any(proxy_chat))
        .route("/api/chat", any(proxy_chat))
        .route("/api/video/{*rest}", any(proxy_video))
        .route("/api/video", any(proxy_video))
        .fallback(fallback)
        .with_state(state)
}

#[derive(Serialize)]
struct HealthBackends {
    auth: String,
    chat: String,
    video: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    timestamp: chrono::DateTime<Utc>,
    backends: HealthBackends,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "gateway",
        timestamp: Utc::now(),
        backends: HealthBackends {
            auth: state.inner.auth.base_url.clone(),
            chat: state.inner.chat.base_url.clone(),
            video: state.inner.video.base_url.clone(),
        },
    })
}

async fn api_docs_index() -> Html<&'static str> {
    Html(
        r#"<!doctype html>
<html>
<head><title>realtime-collab API docs</title></head>
<body>
<h1>realtime-collab</h1>
<ul>
<li><a href="/api-docs/auth">auth</a></li>
<li><a href="/api-docs/chat">chat</a></li>
<li><a href="/api-docs/video">video</a></li>
</ul>
</body>
</html>"#,
    )
}

async fn api_docs_backend(
    axum::extract::Path(backend): axum::extract::Path<String>,
) -> Html<String> {
    Html(format!(
        "<!doctype html><html><body><h1>{backend} API</h1><p>See the {backend} engine's own OpenAPI document.</p></body></html>"
    ))
}

fn path_and_query(uri: &axum::http::Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

async fn proxy_auth(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    req: Request<Body>,
) -> Result<Response, GatewayError> {
    let target = proxy::rewrite_path(&path_and_query(&uri), "/api/auth", "/auth");
    Ok(proxy::proxy(&state.inner.auth, &target, req).await?.into_response())
}

async fn proxy_chat(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    req: Request<Body>,
) -> Result<Response, GatewayError> {
    let target = proxy::rewrite_path(&path_and_query(&uri), "/api/chat", "");
    Ok(proxy::proxy(&state.inner.chat, &target, req).await?.into_response())
}

async fn proxy_video(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    req: Request<Body>,
) -> Result<Response, GatewayError> {
    let target = proxy::rewrite_path(&path_and_query(&uri), "/api/video", "");
    Ok(proxy::proxy(&state.inner.video, &target, req).await?.into_response())
}

/// Anything not matched above. An upgrade request with no identifying
/// `/api/{chat,video}` prefix is the bare duplex default path and maps
/// to Chat (§4.1 fallback rule); everything else is a 404.
async fn fallback(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    req: Request<Body>,
) -> Result<Response, GatewayError> {
    let is_upgrade = req
        .headers()
        .get(axum::http::header::UPGRADE)
        .is_some();
    if is_upgrade {
        let target = path_and_query(&uri);
        return Ok(proxy::proxy(&state.inner.chat, &target, req).await?.into_response());
    }
    Ok((StatusCode::NOT_FOUND, "not found").into_response())
}
