//! Session middleware.
//!
//! Resolves the session cookie once per request into an explicit
//! [`SessionContext`] extension, so handlers receive the session as a value
//! instead of reading ambient state. Resolution never rejects a request;
//! handlers that need an identity decide what a missing session means.

use axum::{body::Body, extract::Request, middleware::Next, response::Response};

use crate::auth::read_session_token;

/// The session context attached to every request.
#[derive(Clone, Debug, Default)]
pub struct SessionContext {
    /// Raw session token from the cookie, if any. Resolving it to a user
    /// is a provider round trip, done only by handlers that need it.
    pub token: Option<String>,
}

pub async fn session_middleware(mut request: Request<Body>, next: Next) -> Response {
    let token = read_session_token(request.headers());
    request.extensions_mut().insert(SessionContext { token });
    next.run(request).await
}
