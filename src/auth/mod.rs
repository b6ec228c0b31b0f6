//! Identity: HTTP client for the hosted auth provider plus explicit
//! session-cookie plumbing.
//!
//! Session state is never ambient. The two capabilities are
//! resolve-session-from-request ([`read_session_token`]) and
//! attach-session-to-response ([`session_cookie_header`]); everything else
//! goes through the [`AuthProvider`] client.

mod provider;
mod session;

pub use provider::{AuthError, AuthProvider, AuthSession, AuthUser};
pub use session::{read_session_token, session_cookie_header, SESSION_COOKIE};
