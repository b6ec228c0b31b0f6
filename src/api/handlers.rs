use std::convert::Infallible;

use axum::{
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::middleware::SessionContext;
use super::AppState;
use crate::auth::{session_cookie_header, AuthError};
use crate::llm::{ChatMessage, RelayRequest};
use crate::models::*;
use crate::personas;
use crate::prompt;

/// Owner attributed to every request when no identity provider is
/// configured (local mode).
pub const ANONYMOUS_USER: &str = "local";

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
/// The full error is logged server-side for debugging, but clients only
/// see a generic message to avoid leaking internal details.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Resolve the request's session to a user id. In local mode everything
/// belongs to the anonymous user; with a provider configured, a missing or
/// stale session is a 401.
async fn current_user_id(
    state: &AppState,
    session: &SessionContext,
) -> Result<String, (StatusCode, String)> {
    let auth = match &state.auth {
        Some(auth) => auth,
        None => return Ok(ANONYMOUS_USER.to_string()),
    };

    let token = session
        .token
        .as_deref()
        .ok_or((StatusCode::UNAUTHORIZED, "로그인이 필요합니다.".to_string()))?;

    match auth.get_user(token).await {
        Ok(user) => Ok(user.id),
        Err(AuthError::Rejected { .. }) => {
            Err((StatusCode::UNAUTHORIZED, "로그인이 필요합니다.".to_string()))
        }
        Err(e) => Err(internal_error(e)),
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Conversation
// ============================================================

/// One history entry on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

/// Body of the conversation endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Prior history plus the just-submitted user message, in order.
    pub messages: Vec<ChatTurn>,
    pub project_id: String,
    /// Requested expert persona; unknown or absent falls back to default.
    #[serde(default, alias = "expertId")]
    pub persona_id: Option<String>,
    /// Inline project context, used instead of a store read when present.
    #[serde(default)]
    pub project_data: Option<Requirements>,
    /// One-time flag for freshly created projects: the assistant greets
    /// first, without a prior user message.
    #[serde(default)]
    pub is_initial: bool,
}

/// Relay a conversation to the inference endpoint and stream the reply.
///
/// On success the body is a chunked text/plain stream that ends when the
/// underlying inference stream does. Pre-stream failures return JSON
/// `{"error": ...}` with HTTP 500. A mid-stream failure simply terminates
/// the body early; persistence of partial output is the caller's concern.
pub async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    let model = match &state.model {
        Some(model) => model.clone(),
        None => {
            tracing::error!("Chat request with no inference credential configured");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "API Key Missing" })),
            )
                .into_response();
        }
    };

    let persona = match req.persona_id.as_deref() {
        Some(id) => personas::resolve(id),
        None => personas::default_persona(),
    };

    let instruction = match &req.project_data {
        Some(requirements) => {
            let title = if requirements.idea.trim().is_empty() {
                None
            } else {
                Some(summarize_title(&requirements.idea))
            };
            prompt::assemble_with_context(
                persona,
                &ProjectContext {
                    title,
                    requirements: requirements.clone(),
                },
                req.is_initial,
            )
        }
        None => prompt::assemble(&state.db, &req.project_id, persona, req.is_initial),
    };

    let history: Vec<ChatMessage> = req
        .messages
        .iter()
        .filter_map(|turn| {
            Role::from_str(&turn.role).map(|role| ChatMessage {
                role,
                content: turn.content.clone(),
            })
        })
        .collect();

    let request = RelayRequest {
        system_instruction: instruction,
        history,
    };

    let (tx, rx) = mpsc::channel::<String>(32);
    tokio::spawn(async move {
        if let Err(e) = model.stream(request, tx).await {
            // The response status is already committed; the stream just
            // ends early and the client sees an incomplete reply.
            tracing::error!(error = %e, "Inference stream failed");
        }
    });

    let body = Body::from_stream(futures::stream::unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|chunk| (Ok::<_, Infallible>(Bytes::from(chunk)), rx))
    }));

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

// ============================================================
// Image Generation
// ============================================================

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
}

/// Generate one product-concept image from a prompt. The encoded result is
/// wrapped as a data URL so the client can render it directly.
pub async fn generate_image(
    State(state): State<AppState>,
    Json(req): Json<ImageRequest>,
) -> Response {
    let model = match &state.images {
        Some(model) => model.clone(),
        None => {
            tracing::error!("Image request with no inference credential configured");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "API Key Missing" })),
            )
                .into_response();
        }
    };

    match model.generate(&req.prompt).await {
        Ok(encoded) => Json(serde_json::json!({
            "imageUrl": format!("data:image/png;base64,{}", encoded)
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Image generation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "이미지 생성 실패" })),
            )
                .into_response()
        }
    }
}

// ============================================================
// Projects
// ============================================================

pub async fn create_project(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Json(input): Json<CreateProjectInput>,
) -> Result<(StatusCode, Json<Project>), (StatusCode, String)> {
    let user_id = current_user_id(&state, &session).await?;

    // The provisioning boundary is where requirements are validated; past
    // this point the document is write-once.
    if !input.requirements.complete() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Requirements are incomplete".to_string(),
        ));
    }

    state
        .db
        .create_project(&user_id, input)
        .map(|p| (StatusCode::CREATED, Json(p)))
        .map_err(internal_error)
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Vec<Project>>, (StatusCode, String)> {
    let user_id = current_user_id(&state, &session).await?;
    state
        .db
        .get_projects_by_user(&user_id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, (StatusCode, String)> {
    state
        .db
        .get_project(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Project not found".to_string()))
}

// ============================================================
// Messages
// ============================================================

/// Transcript replay, oldest first.
///
/// The id is accepted as a raw string: a malformed id from direct
/// navigation resolves to an empty, non-erroring transcript, same as a
/// project with no messages.
pub async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Message>>, (StatusCode, String)> {
    let project_id = match Uuid::parse_str(&id) {
        Ok(project_id) => project_id,
        Err(_) => return Ok(Json(Vec::new())),
    };

    state
        .db
        .get_messages(project_id)
        .map(Json)
        .map_err(internal_error)
}

/// Append one message to a project's transcript (turn persistence over
/// HTTP). Single insert; no transaction ties it to anything else.
pub async fn append_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateMessageInput>,
) -> Result<(StatusCode, Json<Message>), (StatusCode, String)> {
    state
        .db
        .get_project(id)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Project not found".to_string()))?;

    state
        .db
        .append_message(id, input.role, &input.content)
        .map(|m| (StatusCode::CREATED, Json(m)))
        .map_err(internal_error)
}

// ============================================================
// Auth
// ============================================================

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Password sign-in. On success the session cookie is attached to the
/// response.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Response, (StatusCode, String)> {
    let auth = state.auth.as_ref().ok_or((
        StatusCode::SERVICE_UNAVAILABLE,
        "Auth is not configured".to_string(),
    ))?;

    match auth.sign_in_with_password(&input.email, &input.password).await {
        Ok(session) => {
            let cookie = session_cookie_header(&session.access_token, session.expires_in);
            Ok((
                [(header::SET_COOKIE, cookie)],
                Json(serde_json::json!({
                    "user": { "id": session.user.id, "email": session.user.email }
                })),
            )
                .into_response())
        }
        Err(AuthError::Rejected { .. }) => Err((
            StatusCode::UNAUTHORIZED,
            "이메일 또는 비밀번호가 올바르지 않습니다.".to_string(),
        )),
        Err(e) => Err(internal_error(e)),
    }
}

/// OAuth sign-in entry point: send the browser to the provider's authorize
/// URL, which redirects back to `/auth/callback` with a code.
pub async fn oauth_login(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Response {
    match &state.auth {
        Some(auth) => {
            let redirect_to = format!("{}/auth/callback", state.site_url);
            Redirect::to(&auth.oauth_authorize_url(&provider, &redirect_to)).into_response()
        }
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Auth is not configured".to_string(),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

/// OAuth callback: exchange the provider's code for a session, attach the
/// cookie and land on the app root. Any failure redirects back to the
/// login view with an error parameter.
pub async fn auth_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let (Some(auth), Some(code)) = (&state.auth, &query.code) {
        match auth.exchange_code_for_session(code).await {
            Ok(session) => {
                let cookie = session_cookie_header(&session.access_token, session.expires_in);
                return ([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response();
            }
            Err(e) => tracing::warn!(error = %e, "Code exchange failed"),
        }
    }

    Redirect::to("/login?error=auth_failed").into_response()
}
