use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use tokio::sync::mpsc;

use aidee::api::{create_router, AppState};
use aidee::auth::AuthProvider;
use aidee::db::Database;
use aidee::llm::{ChatModel, ImageModel, LlmError, RelayRequest};
use aidee::models::*;

/// Inference stand-in: emits a fixed chunk sequence and records the last
/// relayed request for inspection.
struct FakeModel {
    chunks: Vec<&'static str>,
    last_request: Arc<Mutex<Option<RelayRequest>>>,
}

impl FakeModel {
    fn new(chunks: Vec<&'static str>) -> Self {
        Self {
            chunks,
            last_request: Arc::new(Mutex::new(None)),
        }
    }
}

#[async_trait]
impl ChatModel for FakeModel {
    async fn stream(
        &self,
        request: RelayRequest,
        chunk_tx: mpsc::Sender<String>,
    ) -> Result<(), LlmError> {
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request);
        }
        for chunk in &self.chunks {
            if chunk_tx.send(chunk.to_string()).await.is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Image endpoint stand-in with a fixed, inspectable outcome.
struct FakeImageModel {
    fail: bool,
}

#[async_trait]
impl ImageModel for FakeImageModel {
    async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        if self.fail {
            Err(LlmError::InvalidResponse("simulated failure".to_string()))
        } else {
            Ok("aGVsbG8=".to_string())
        }
    }
}

fn setup_state(
    model: Option<Arc<dyn ChatModel>>,
    images: Option<Arc<dyn ImageModel>>,
    auth: Option<Arc<AuthProvider>>,
) -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let app = create_router(AppState::new(db, model, images, auth));
    TestServer::new(app).expect("Failed to create test server")
}

fn setup_with_model(model: Option<Arc<dyn ChatModel>>) -> TestServer {
    setup_state(model, None, None)
}

fn setup() -> TestServer {
    setup_with_model(Some(Arc::new(FakeModel::new(vec!["안", "녕하세요"]))))
}

fn filled_requirements() -> Requirements {
    Requirements {
        goal: "아이디어 구체화".to_string(),
        categories: vec!["조명".to_string()],
        budget_min: 2000,
        budget_max: 7500,
        size: "소형 (10~50cm)".to_string(),
        features: vec!["빛·색 변화".to_string()],
        duration: "3개월".to_string(),
        usage: "대량 판매".to_string(),
        idea: "감성적인 무드등을 만들고 싶어요".to_string(),
        ..Default::default()
    }
}

async fn create_test_project(server: &TestServer) -> Project {
    server
        .post("/api/projects")
        .json(&CreateProjectInput {
            requirements: filled_requirements(),
        })
        .await
        .json::<Project>()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let server = setup();
        let response = server.get("/api/health").await;
        response.assert_status_ok();
    }
}

mod projects {
    use super::*;

    #[tokio::test]
    async fn creates_a_project_from_a_complete_form() {
        let server = setup();
        let response = server
            .post("/api/projects")
            .json(&CreateProjectInput {
                requirements: filled_requirements(),
            })
            .await;

        response.assert_status(StatusCode::CREATED);
        let project: Project = response.json();
        assert_eq!(project.requirements.goal, "아이디어 구체화");
        // Title is the first 15 chars of the idea text.
        assert_eq!(project.title.as_deref(), Some("감성적인 무드등을 만들고 싶어..."));
    }

    #[tokio::test]
    async fn rejects_an_incomplete_form() {
        let server = setup();
        let mut requirements = filled_requirements();
        requirements.idea.clear();

        let response = server
            .post("/api/projects")
            .json(&CreateProjectInput { requirements })
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn lists_created_projects() {
        let server = setup();
        create_test_project(&server).await;
        create_test_project(&server).await;

        let response = server.get("/api/projects").await;
        response.assert_status_ok();
        let projects: Vec<Project> = response.json();
        assert_eq!(projects.len(), 2);
    }

    #[tokio::test]
    async fn returns_404_for_unknown_project() {
        let server = setup();
        let response = server
            .get(&format!("/api/projects/{}", uuid::Uuid::new_v4()))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn fetches_a_project_by_id() {
        let server = setup();
        let created = create_test_project(&server).await;

        let response = server.get(&format!("/api/projects/{}", created.id)).await;
        response.assert_status_ok();
        let fetched: Project = response.json();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.title, created.title);
    }
}

mod messages {
    use super::*;

    #[tokio::test]
    async fn appends_and_replays_in_order() {
        let server = setup();
        let project = create_test_project(&server).await;

        for (role, content) in [
            (Role::User, "안녕하세요"),
            (Role::Assistant, "반갑습니다"),
            (Role::User, "무드등을 만들고 싶어요"),
        ] {
            let response = server
                .post(&format!("/api/projects/{}/messages", project.id))
                .json(&CreateMessageInput {
                    role,
                    content: content.to_string(),
                })
                .await;
            response.assert_status(StatusCode::CREATED);
        }

        let response = server
            .get(&format!("/api/projects/{}/messages", project.id))
            .await;
        response.assert_status_ok();
        let transcript: Vec<Message> = response.json();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[0].content, "안녕하세요");
        assert_eq!(transcript[1].role, Role::Assistant);
        assert_eq!(transcript[2].content, "무드등을 만들고 싶어요");

        // Replay is stable across refetches.
        let again: Vec<Message> = server
            .get(&format!("/api/projects/{}/messages", project.id))
            .await
            .json();
        assert_eq!(again.len(), 3);
        assert_eq!(again[0].id, transcript[0].id);
    }

    #[tokio::test]
    async fn append_to_unknown_project_is_404() {
        let server = setup();
        let response = server
            .post(&format!("/api/projects/{}/messages", uuid::Uuid::new_v4()))
            .json(&CreateMessageInput {
                role: Role::User,
                content: "hello".to_string(),
            })
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_project_id_yields_empty_transcript() {
        let server = setup();
        let response = server.get("/api/projects/not-a-uuid/messages").await;
        response.assert_status_ok();
        let transcript: Vec<Message> = response.json();
        assert!(transcript.is_empty());
    }
}

mod chat {
    use super::*;

    fn chat_body(project_id: &str) -> serde_json::Value {
        serde_json::json!({
            "messages": [
                { "role": "user", "content": "무드등을 만들고 싶어요" }
            ],
            "projectId": project_id,
        })
    }

    #[tokio::test]
    async fn streams_the_model_reply_as_text() {
        let server = setup();
        let project = create_test_project(&server).await;

        let response = server
            .post("/api/chat")
            .json(&chat_body(&project.id.to_string()))
            .await;

        response.assert_status_ok();
        assert_eq!(response.text(), "안녕하세요");
    }

    #[tokio::test]
    async fn relays_project_context_and_history() {
        let model = Arc::new(FakeModel::new(vec!["ok"]));
        let last_request = model.last_request.clone();
        let server = setup_with_model(Some(model));
        let project = create_test_project(&server).await;

        server
            .post("/api/chat")
            .json(&chat_body(&project.id.to_string()))
            .await
            .assert_status_ok();

        let request = last_request
            .lock()
            .unwrap()
            .take()
            .expect("Model was not called");
        assert!(request.system_instruction.contains("감성적인 무드등을"));
        assert!(request.system_instruction.contains("STEP 1 단계를 막 마친 상태"));
        assert_eq!(request.history.len(), 1);
        assert_eq!(request.history[0].content, "무드등을 만들고 싶어요");
    }

    #[tokio::test]
    async fn inline_project_data_skips_the_store() {
        let model = Arc::new(FakeModel::new(vec!["ok"]));
        let last_request = model.last_request.clone();
        let server = setup_with_model(Some(model));

        let response = server
            .post("/api/chat")
            .json(&serde_json::json!({
                "messages": [],
                "projectId": "pending",
                "projectData": { "idea": "감성적인 무드등" },
                "isInitial": true,
            }))
            .await;
        response.assert_status_ok();

        let request = last_request
            .lock()
            .unwrap()
            .take()
            .expect("Model was not called");
        assert!(request.system_instruction.contains("감성적인 무드등"));
        assert!(request.system_instruction.contains("먼저 인사를"));
    }

    #[tokio::test]
    async fn unknown_persona_falls_back_to_default() {
        let model = Arc::new(FakeModel::new(vec!["ok"]));
        let last_request = model.last_request.clone();
        let server = setup_with_model(Some(model));

        let mut body = chat_body(&uuid::Uuid::new_v4().to_string());
        body["expertId"] = "no-such-expert".into();
        server.post("/api/chat").json(&body).await.assert_status_ok();

        let request = last_request
            .lock()
            .unwrap()
            .take()
            .expect("Model was not called");
        assert!(request.system_instruction.contains("기획 전략가"));
    }

    #[tokio::test]
    async fn missing_credential_is_a_fixed_500() {
        let server = setup_with_model(None);

        let response = server
            .post("/api/chat")
            .json(&chat_body(&uuid::Uuid::new_v4().to_string()))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "API Key Missing");
    }
}

mod images {
    use super::*;

    #[tokio::test]
    async fn returns_the_generated_image_as_a_data_url() {
        let server = setup_state(None, Some(Arc::new(FakeImageModel { fail: false })), None);

        let response = server
            .post("/api/images")
            .json(&serde_json::json!({ "prompt": "따뜻한 무드등" }))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["imageUrl"], "data:image/png;base64,aGVsbG8=");
    }

    #[tokio::test]
    async fn generation_failure_is_a_500_with_a_fixed_message() {
        let server = setup_state(None, Some(Arc::new(FakeImageModel { fail: true })), None);

        let response = server
            .post("/api/images")
            .json(&serde_json::json!({ "prompt": "따뜻한 무드등" }))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "이미지 생성 실패");
    }

    #[tokio::test]
    async fn missing_credential_is_a_fixed_500() {
        let server = setup_state(None, None, None);

        let response = server
            .post("/api/images")
            .json(&serde_json::json!({ "prompt": "따뜻한 무드등" }))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "API Key Missing");
    }
}

mod auth {
    use super::*;

    #[tokio::test]
    async fn callback_without_provider_redirects_to_login_error() {
        let server = setup();
        let response = server.get("/auth/callback?code=abc").await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(
            response.header("location").to_str().unwrap(),
            "/login?error=auth_failed"
        );
    }

    #[tokio::test]
    async fn callback_without_code_redirects_to_login_error() {
        let server = setup();
        let response = server.get("/auth/callback").await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(
            response.header("location").to_str().unwrap(),
            "/login?error=auth_failed"
        );
    }

    #[tokio::test]
    async fn oauth_login_redirects_to_the_provider_authorize_url() {
        let auth = Arc::new(AuthProvider::new("https://auth.example.com/auth/v1", "anon"));
        let server = setup_state(None, None, Some(auth));

        let response = server.get("/api/auth/oauth/google").await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(
            response.header("location").to_str().unwrap(),
            "https://auth.example.com/auth/v1/authorize?provider=google\
             &redirect_to=http://localhost:3000/auth/callback"
        );
    }

    #[tokio::test]
    async fn oauth_login_without_provider_is_unavailable() {
        let server = setup();
        let response = server.get("/api/auth/oauth/google").await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn login_without_provider_is_unavailable() {
        let server = setup();
        let response = server
            .post("/api/auth/login")
            .json(&serde_json::json!({ "email": "a@b.c", "password": "pw" }))
            .await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }
}
