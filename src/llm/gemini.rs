//! Gemini streaming client.
//!
//! Talks to the `streamGenerateContent` endpoint in SSE mode and forwards
//! text deltas as they arrive. Deliberately has no retry loop: a dropped
//! stream surfaces as an error and the caller decides whether to resend.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use super::{ChatMessage, ChatModel, LlmError, RelayRequest};
use crate::config::Config;
use crate::models::Role;

/// Hard wall-clock ceiling on a full relay round trip.
pub const RELAY_TIMEOUT_SECS: u64 = 30;

pub(super) const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug)]
pub struct GeminiClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
}

impl GeminiClient {
    /// Create a client from configuration. The missing credential is a
    /// configuration error raised here, before any endpoint contact.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let api_key = config.gemini_api_key.clone().ok_or(LlmError::MissingApiKey)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(RELAY_TIMEOUT_SECS))
            .build()
            .map_err(LlmError::Network)?;

        Ok(Self {
            model: config.gemini_model.clone(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http,
        })
    }

    fn build_request_body(&self, request: &RelayRequest) -> serde_json::Value {
        serde_json::json!({
            "systemInstruction": {
                "parts": [{ "text": request.system_instruction }]
            },
            "contents": convert_history(&request.history),
        })
    }
}

/// Convert internal history entries to the Gemini contents format. The
/// endpoint calls the assistant role "model".
fn convert_history(history: &[ChatMessage]) -> Vec<serde_json::Value> {
    history
        .iter()
        .map(|msg| {
            let role = match msg.role {
                Role::User => "user",
                Role::Assistant => "model",
            };
            serde_json::json!({
                "role": role,
                "parts": [{ "text": msg.content }],
            })
        })
        .collect()
}

/// Forward text deltas to the consumer. Returns false once the receiver
/// has gone away, so the caller can drop the upstream connection instead
/// of draining it to completion.
async fn forward_chunks(texts: Vec<String>, chunk_tx: &mpsc::Sender<String>) -> bool {
    for text in texts {
        if chunk_tx.send(text).await.is_err() {
            return false;
        }
    }
    true
}

/// Pull the text deltas out of one SSE payload.
fn extract_text(data: &serde_json::Value) -> Vec<String> {
    let mut parts = Vec::new();
    if let Some(candidates) = data["candidates"].as_array() {
        for candidate in candidates {
            if let Some(blocks) = candidate["content"]["parts"].as_array() {
                for block in blocks {
                    if let Some(text) = block["text"].as_str() {
                        parts.push(text.to_string());
                    }
                }
            }
        }
    }
    parts
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn stream(
        &self,
        request: RelayRequest,
        chunk_tx: mpsc::Sender<String>,
    ) -> Result<(), LlmError> {
        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        );
        let body = self.build_request_body(&request);

        let http_request = self
            .http
            .post(url)
            .header("x-goog-api-key", self.api_key.clone())
            .header("content-type", "application/json")
            .json(&body);

        let mut es =
            EventSource::new(http_request).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        while let Some(event) = es.next().await {
            match event {
                Ok(Event::Open) => {
                    debug!("stream: connection open");
                }
                Ok(Event::Message(msg)) => {
                    let data: serde_json::Value =
                        serde_json::from_str(&msg.data).map_err(LlmError::Json)?;
                    if !forward_chunks(extract_text(&data), &chunk_tx).await {
                        debug!("stream: consumer gone, dropping connection");
                        break;
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => {
                    debug!("stream: ended");
                    break;
                }
                Err(reqwest_eventsource::Error::InvalidStatusCode(status, response)) => {
                    let message = response.text().await.unwrap_or_default();
                    return Err(LlmError::ApiError {
                        status: status.as_u16(),
                        message,
                    });
                }
                Err(reqwest_eventsource::Error::Transport(e)) => {
                    return Err(LlmError::Network(e));
                }
                Err(e) => {
                    return Err(LlmError::InvalidResponse(e.to_string()));
                }
            }
        }

        Ok(())
    }
}
