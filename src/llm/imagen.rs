//! Imagen image-generation client.
//!
//! Single-shot prediction call against the `:predict` endpoint; the result
//! comes back as one base64-encoded PNG. No streaming, no retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::gemini::{DEFAULT_BASE_URL, RELAY_TIMEOUT_SECS};
use super::{ImageModel, LlmError};
use crate::config::Config;

#[derive(Debug)]
pub struct ImagenClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
}

impl ImagenClient {
    /// Create a client from configuration. Shares the inference credential
    /// with the chat client; its absence fails here, before any network
    /// call.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let api_key = config.gemini_api_key.clone().ok_or(LlmError::MissingApiKey)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(RELAY_TIMEOUT_SECS))
            .build()
            .map_err(LlmError::Network)?;

        Ok(Self {
            model: config.imagen_model.clone(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http,
        })
    }

    fn build_request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "instances": [{ "prompt": prompt }],
            "parameters": { "sampleCount": 1 },
        })
    }
}

/// Pull the encoded image out of a prediction response.
fn extract_image(data: &serde_json::Value) -> Option<String> {
    data["predictions"]
        .as_array()?
        .first()?["bytesBase64Encoded"]
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl ImageModel for ImagenClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/v1beta/models/{}:predict", self.base_url, self.model);

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", self.api_key.clone())
            .json(&self.build_request_body(prompt))
            .send()
            .await
            .map_err(LlmError::Network)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message });
        }

        let data: serde_json::Value = response.json().await.map_err(LlmError::Network)?;
        extract_image(&data)
            .ok_or_else(|| LlmError::InvalidResponse("no image in prediction response".to_string()))
    }
}
