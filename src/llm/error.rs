//! Relay error types.

use thiserror::Error;

/// Errors that can occur while relaying a conversation to the inference
/// endpoint. None of these are retried: a failed or interrupted stream can
/// only be re-requested from scratch by the caller.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The inference credential is not configured. Raised before any
    /// network call is made.
    #[error("API Key Missing")]
    MissingApiKey,

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Whether this is a configuration problem rather than a runtime one.
    pub fn is_config(&self) -> bool {
        matches!(self, LlmError::MissingApiKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_a_config_error_with_fixed_message() {
        let err = LlmError::MissingApiKey;
        assert!(err.is_config());
        assert_eq!(err.to_string(), "API Key Missing");
    }

    #[test]
    fn api_errors_are_not_config_errors() {
        let err = LlmError::ApiError {
            status: 503,
            message: "overloaded".to_string(),
        };
        assert!(!err.is_config());
    }
}
