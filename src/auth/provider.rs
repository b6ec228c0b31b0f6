use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Auth request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Auth rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// An authenticated session as issued by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Client for a GoTrue-style identity endpoint.
///
/// Capabilities consumed: password sign-in, OAuth redirect, code-for-session
/// exchange, session-to-user resolution. The anon key authenticates the
/// application itself on every call.
pub struct AuthProvider {
    base_url: String,
    anon_key: String,
    http: Client,
}

impl AuthProvider {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            anon_key: anon_key.into(),
            http: Client::new(),
        }
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let url = format!("{}/token?grant_type=password", self.base_url);
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        Self::parse_session(response).await
    }

    /// The URL the browser is sent to for OAuth sign-in. The provider
    /// redirects back to `redirect_to` (our `/auth/callback`) with a code.
    pub fn oauth_authorize_url(&self, provider: &str, redirect_to: &str) -> String {
        format!(
            "{}/authorize?provider={}&redirect_to={}",
            self.base_url, provider, redirect_to
        )
    }

    pub async fn exchange_code_for_session(&self, code: &str) -> Result<AuthSession, AuthError> {
        let url = format!("{}/token?grant_type=pkce", self.base_url);
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "auth_code": code }))
            .send()
            .await?;

        Self::parse_session(response).await
    }

    /// Resolve a session token to its user.
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let url = format!("{}/user", self.base_url);
        let response = self
            .http
            .get(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        Ok(response.json().await?)
    }

    async fn parse_session(response: reqwest::Response) -> Result<AuthSession, AuthError> {
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        Ok(response.json().await?)
    }

    async fn rejection(response: reqwest::Response) -> AuthError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        AuthError::Rejected { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_carries_provider_and_redirect() {
        let auth = AuthProvider::new("https://auth.example.com/auth/v1", "anon");
        let url = auth.oauth_authorize_url("google", "http://localhost:3000/auth/callback");
        assert_eq!(
            url,
            "https://auth.example.com/auth/v1/authorize?provider=google&redirect_to=http://localhost:3000/auth/callback"
        );
    }

    #[test]
    fn session_parses_with_optional_fields_absent() {
        let session: AuthSession = serde_json::from_str(
            r#"{"access_token":"tok","user":{"id":"user-1"}}"#,
        )
        .unwrap();
        assert_eq!(session.access_token, "tok");
        assert_eq!(session.user.id, "user-1");
        assert!(session.refresh_token.is_none());
        assert!(session.user.email.is_none());
    }
}
