//! OpenAI-compatible chat-completions client
//!
//! Streaming calls feed the orchestrator; simple calls serve quick rewrites
//! where streaming is overkill.

use std::time::Duration;

use futures::StreamExt;
use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::sse::{SseDecoder, SseEvent};
use crate::error::{Result, SopError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const FRAGMENT_BUFFER: usize = 64;

/// Endpoint, credentials and sampling settings for the upstream model
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Full chat-completions URL
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
}

/// Client for the upstream language model
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl UpstreamClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }

    fn build_request(&self) -> RequestBuilder {
        let request = self.http.post(&self.config.endpoint);
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Start a streaming completion.
    ///
    /// The request runs on its own task; fragments (or the first error) arrive
    /// on the returned stream, which ends after `[DONE]`. Cancelling `cancel`
    /// drops the upstream connection.
    pub fn stream_completion(
        &self,
        system_prompt: &str,
        user_message: &str,
        cancel: CancellationToken,
    ) -> ReceiverStream<Result<String>> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_message}
            ],
            "temperature": self.config.temperature,
            "stream": true
        });
        let request = self.build_request().json(&body);
        let (tx, rx) = mpsc::channel(FRAGMENT_BUFFER);

        info!(model = %self.config.model, "Starting upstream completion stream");
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => debug!("Upstream stream cancelled"),
                result = pump(request, tx.clone()) => {
                    if let Err(e) = result {
                        let _ = tx.send(Err(e)).await;
                    }
                }
            }
        });

        ReceiverStream::new(rx)
    }

    /// Make a simple non-streaming call and return the trimmed text content
    pub async fn complete(
        &self,
        system_prompt: Option<&str>,
        user_message: &str,
        temperature: f32,
    ) -> Result<String> {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(serde_json::json!({"role": "system", "content": system}));
        }
        messages.push(serde_json::json!({"role": "user", "content": user_message}));

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": temperature
        });

        let response = self.build_request().json(&body).send().await?;
        let response = handle_error_response(response).await?;
        let json: Value = response.json().await?;

        // Extract text from OpenAI response format
        let text = json
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"))
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .trim()
            .to_string();

        Ok(text)
    }
}

async fn handle_error_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), "Upstream request failed");
    Err(SopError::Upstream {
        status: status.as_u16(),
        body,
    })
}

async fn pump(request: RequestBuilder, tx: mpsc::Sender<Result<String>>) -> Result<()> {
    let response = handle_error_response(request.send().await?).await?;
    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        for event in decoder.push(&chunk) {
            if !forward(event, &tx).await? {
                return Ok(());
            }
        }
    }

    if let Some(event) = decoder.finish() {
        forward(event, &tx).await?;
    }
    Ok(())
}

/// Returns false once reading should stop
async fn forward(event: SseEvent, tx: &mpsc::Sender<Result<String>>) -> Result<bool> {
    match event {
        SseEvent::TextDelta(text) => Ok(tx.send(Ok(text)).await.is_ok()),
        SseEvent::Done => Ok(false),
        SseEvent::Error(message) => Err(SopError::UpstreamReported(message)),
    }
}
