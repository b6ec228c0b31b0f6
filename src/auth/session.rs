use axum::http::HeaderMap;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "aidee-session";

/// Default session lifetime in seconds when the provider reports none.
const DEFAULT_MAX_AGE: u64 = 3600;

/// Build the `Set-Cookie` value that attaches a session to a response.
pub fn session_cookie_header(token: &str, max_age: Option<u64>) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        max_age.unwrap_or(DEFAULT_MAX_AGE)
    )
}

/// Resolve the session token from a request's Cookie header, if present.
pub fn read_session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get("cookie")?.to_str().ok()?;
    for pair in cookies.split(';') {
        let pair = pair.trim();
        if let Some(value) = pair.strip_prefix(SESSION_COOKIE) {
            if let Some(token) = value.strip_prefix('=') {
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }
    None
}
