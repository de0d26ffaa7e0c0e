//! HTTP surface
//!
//! Thin adapter over the core crate: request parsing, the SSE response and
//! file downloads. All synthesis work happens in [`Orchestrator`].

mod chat;
mod download;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use sopwright_core::ai::UpstreamClient;
use sopwright_core::Orchestrator;

/// Shared application state for handlers.
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub client: UpstreamClient,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, client: UpstreamClient) -> Arc<Self> {
        Arc::new(Self {
            orchestrator,
            client,
        })
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/chat", post(chat::chat))
        .route("/api/chat/stream", post(chat::chat))
        .route("/api/magic-sop", post(chat::magic_sop))
        .route("/download/doc/:filename", get(download::download_doc))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "sopwright",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `{"error": message}` with the given status
fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
