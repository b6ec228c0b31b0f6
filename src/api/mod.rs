mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::AuthProvider;
use crate::db::Database;
use crate::llm::{ChatModel, ImageModel};

pub use handlers::{ChatRequest, ChatTurn};

const DEFAULT_SITE_URL: &str = "http://localhost:3000";

/// Shared state for request handlers. Handlers themselves are stateless;
/// everything mutable lives behind the store or the collaborators here.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// None when the inference credential is not configured; the chat
    /// endpoint then fails with a fixed 500 before contacting anything.
    pub model: Option<Arc<dyn ChatModel>>,
    /// None alongside `model`; the image endpoint shares its credential.
    pub images: Option<Arc<dyn ImageModel>>,
    /// None in local mode; requests are then attributed to the anonymous
    /// local user and login is unavailable.
    pub auth: Option<Arc<AuthProvider>>,
    /// Externally visible origin, used for OAuth redirect URLs.
    pub site_url: String,
}

impl AppState {
    pub fn new(
        db: Database,
        model: Option<Arc<dyn ChatModel>>,
        images: Option<Arc<dyn ImageModel>>,
        auth: Option<Arc<AuthProvider>>,
    ) -> Self {
        Self {
            db,
            model,
            images,
            auth,
            site_url: DEFAULT_SITE_URL.to_string(),
        }
    }

    pub fn with_site_url(mut self, site_url: impl Into<String>) -> Self {
        self.site_url = site_url.into();
        self
    }
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Conversation
        .route("/chat", post(handlers::chat))
        // Image generation
        .route("/images", post(handlers::generate_image))
        // Projects
        .route("/projects", get(handlers::list_projects))
        .route("/projects", post(handlers::create_project))
        .route("/projects/{id}", get(handlers::get_project))
        .route("/projects/{id}/messages", get(handlers::list_messages))
        .route("/projects/{id}/messages", post(handlers::append_message))
        // Auth
        .route("/auth/login", post(handlers::login))
        .route("/auth/oauth/{provider}", get(handlers::oauth_login))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api", api)
        .route("/auth/callback", get(handlers::auth_callback))
        .layer(axum::middleware::from_fn(middleware::session_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
