//! The conversation relay: forwards message history plus an assembled
//! system instruction to the hosted inference endpoint and streams the
//! response back as text chunks.
//!
//! The relay is a direct pass-through: no prompt truncation, no retry, no
//! backpressure. The chunk sequence is finite and not restartable — an
//! interrupted stream can only be retried from scratch with the same
//! history.

mod error;
mod gemini;
mod imagen;

pub use error::LlmError;
pub use gemini::GeminiClient;
pub use imagen::ImagenClient;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::models::Role;

/// One history entry as sent to the inference endpoint.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Everything needed for one streaming call.
#[derive(Debug, Clone)]
pub struct RelayRequest {
    pub system_instruction: String,
    pub history: Vec<ChatMessage>,
}

/// A streamable inference endpoint.
///
/// Implementations deliver text fragments through `chunk_tx` in arrival
/// order and return once the stream is exhausted. On error the sequence
/// terminates early; any chunks already delivered stay delivered — their
/// disposition is the caller's responsibility.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn stream(
        &self,
        request: RelayRequest,
        chunk_tx: mpsc::Sender<String>,
    ) -> Result<(), LlmError>;
}

/// An image-generation endpoint. One prompt in, one base64-encoded PNG out;
/// no streaming.
#[async_trait]
pub trait ImageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}
