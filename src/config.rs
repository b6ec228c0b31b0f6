//! Environment configuration.
//!
//! Recognized variables:
//! - `GEMINI_API_KEY` — inference credential. Absence is fatal for the
//!   conversation endpoint only; the rest of the server still runs.
//! - `AIDEE_GEMINI_MODEL` — inference model id (default `gemini-2.5-flash`).
//! - `AIDEE_IMAGEN_MODEL` — image-generation model id (default
//!   `imagen-3.0-generate-001`).
//! - `AIDEE_SITE_URL` — externally visible origin for OAuth redirects
//!   (default `http://localhost:3000`).
//! - `AIDEE_AUTH_URL` / `AIDEE_AUTH_ANON_KEY` — identity provider endpoint
//!   and its anonymous credential. When unset the server runs in local
//!   mode with an anonymous owner and no login.
//! - `AIDEE_DB` — database file path (default under the platform data dir).
//! - `RUST_LOG` — tracing filter.

use std::path::PathBuf;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_IMAGEN_MODEL: &str = "imagen-3.0-generate-001";
const DEFAULT_SITE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub imagen_model: String,
    pub auth_url: Option<String>,
    pub auth_anon_key: Option<String>,
    pub db_path: Option<PathBuf>,
    /// Externally visible origin, used to build OAuth redirect URLs.
    pub site_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            gemini_model: non_empty_var("AIDEE_GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            imagen_model: non_empty_var("AIDEE_IMAGEN_MODEL")
                .unwrap_or_else(|| DEFAULT_IMAGEN_MODEL.to_string()),
            auth_url: non_empty_var("AIDEE_AUTH_URL"),
            auth_anon_key: non_empty_var("AIDEE_AUTH_ANON_KEY"),
            db_path: non_empty_var("AIDEE_DB").map(PathBuf::from),
            site_url: non_empty_var("AIDEE_SITE_URL")
                .unwrap_or_else(|| DEFAULT_SITE_URL.to_string()),
        }
    }

    /// A config with no external collaborators, for tests and local mode.
    pub fn for_tests() -> Self {
        Self {
            gemini_api_key: Some("test-key".to_string()),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            imagen_model: DEFAULT_IMAGEN_MODEL.to_string(),
            auth_url: None,
            auth_anon_key: None,
            db_path: None,
            site_url: DEFAULT_SITE_URL.to_string(),
        }
    }

    /// Whether an identity provider is configured. Without one, every
    /// request is attributed to the anonymous local user.
    pub fn auth_configured(&self) -> bool {
        self.auth_url.is_some() && self.auth_anon_key.is_some()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
