//! Axum router for the webhook service.
//!
//! | Route           | Purpose                                          |
//! |-----------------|--------------------------------------------------|
//! | `GET /`         | Minimal HTML form that submits a URL             |
//! | `POST /webhook` | Accept `{"url": …}` and dispatch a job           |
//! | `GET /health`   | Liveness probe                                   |
//!
//! `/webhook` answers `{"status": "accepted"}` as soon as the job has been
//! handed to the dispatcher; the eventual outcome is only visible in the logs.

use crate::dispatch::JobDispatcher;
use axum::{
    extract::State,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<dyn JobDispatcher>,
}

/// Body of `POST /webhook`.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub url: String,
}

/// Body of the `/webhook` and `/health` responses.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub status: String,
}

/// Build the router around a dispatcher.
pub fn build_router(dispatcher: Arc<dyn JobDispatcher>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/webhook", post(webhook))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { dispatcher })
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn webhook(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Json<StatusResponse> {
    info!("Accepted job for {}", payload.url);
    state.dispatcher.dispatch(payload.url).await;
    Json(StatusResponse {
        status: "accepted".into(),
    })
}

async fn health() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".into(),
    })
}

/// The submission page. The status line reflects only the immediate HTTP
/// result of `/webhook`, never the job outcome.
pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html><head><title>Vocab2Post</title>
<style>body{font-family:sans-serif;max-width:500px;margin:50px auto;padding:20px}
input{width:100%;padding:10px;margin:10px 0;box-sizing:border-box}
button{padding:10px 20px;cursor:pointer}</style></head>
<body><h1>Vocab2Post</h1>
<form onsubmit="send(event)"><input id="url" placeholder="Paste PDF URL here" required>
<button type="submit">Submit</button></form><p id="msg"></p>
<script>async function send(e){e.preventDefault();
try{const r=await fetch('/webhook',{method:'POST',headers:{'Content-Type':'application/json'},
body:JSON.stringify({url:document.getElementById('url').value})});
document.getElementById('msg').textContent=r.ok?'Submitted!':'Error';}
catch(_){document.getElementById('msg').textContent='Error';}}</script>
</body></html>"#;
