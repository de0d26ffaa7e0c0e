//! Chat streaming and query rewrite handlers

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, Sse},
        IntoResponse, Json, Response,
    },
};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use sopwright_core::ai::{rewrite_query, sop_prompt, TABLE_ANALYSIS_PROMPT};
use sopwright_core::{PushEvent, PushSink, RequestCancellation};

use super::{error_response, AppState};

const PUSH_BUFFER: usize = 64;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct MagicRequest {
    #[serde(default)]
    pub text: String,
}

/// Stream one SOP request as server-sent push events.
///
/// The orchestrator runs on its own task; the response stream holds the
/// request's drop guard, so a client disconnect cancels the upstream call.
pub async fn chat(State(state): State<Arc<AppState>>, Json(request): Json<ChatRequest>) -> Response {
    let message = request.message.trim();
    if message.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Message is required");
    }
    info!(chars = message.len(), "Chat request");

    let cancel = RequestCancellation::new();
    let (sink, rx) = PushSink::channel(PUSH_BUFFER);
    let upstream = state
        .client
        .stream_completion(TABLE_ANALYSIS_PROMPT, &sop_prompt(message), cancel.child_token());

    let token = cancel.child_token();
    let task_state = Arc::clone(&state);
    tokio::spawn(async move {
        task_state.orchestrator.run(upstream, sink, token).await;
    });

    let guard = cancel.drop_guard();
    let events = ReceiverStream::new(rx).map(move |event| {
        let _held = &guard;
        Ok::<_, Infallible>(to_sse(&event))
    });

    Sse::new(events).into_response()
}

fn to_sse(event: &PushEvent) -> Event {
    Event::default().json_data(event).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to encode push event");
        Event::default().comment("encoding failed")
    })
}

/// Rewrite loose user text into a precise SOP query
pub async fn magic_sop(State(state): State<Arc<AppState>>, Json(request): Json<MagicRequest>) -> Response {
    if request.text.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Text is required");
    }

    match rewrite_query(&state.client, &request.text).await {
        Ok(query) => Json(json!({ "sopQuery": query })).into_response(),
        Err(e) => {
            warn!(error = %e, "Query rewrite failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "AI model error")
        }
    }
}
