//! Context assembly: turns a project's stored requirements and the selected
//! persona into the system instruction sent to the inference endpoint.
//!
//! Assembly never fails. A missing project, a malformed id, or a store
//! error all degrade to defaults (제목 없음, empty requirements) so that
//! conversation can still happen without full context. Failures are logged,
//! not surfaced.

use uuid::Uuid;

use crate::db::Database;
use crate::models::ProjectContext;
use crate::personas::Persona;

/// Fixed operating rules prepended to every assembled instruction.
pub const SYSTEM_PROMPT_TEMPLATE: &str = "\
당신은 'Aidee'의 AI 제품 기획 파트너입니다.

[운영 규칙]
1. 모든 답변은 한국어로 작성합니다.
2. 한 번에 한 가지 주제에 집중해 질문하고, 사용자의 답을 바탕으로 기획을 구체화합니다.
3. 사용자가 정한 예산 범위와 완성 기한을 벗어나는 제안은 하지 않습니다.
4. 답변은 간결하게 작성하고, 선택지가 여러 개일 때는 목록으로 정리합니다.";

/// Title shown when the project has none.
pub const UNTITLED: &str = "제목 없음";

/// Assemble the system instruction for a project and persona.
///
/// Reads only the project's title and requirements from the store. The
/// `project_id` is accepted as a raw string: direct navigation can produce
/// malformed ids, and those degrade to defaults like any other miss.
pub fn assemble(db: &Database, project_id: &str, persona: &Persona, is_initial: bool) -> String {
    let context = fetch_context(db, project_id);
    assemble_with_context(persona, &context, is_initial)
}

/// Assemble from an already-resolved context. The chat endpoint uses this
/// when the caller sent project data inline instead of relying on a store
/// read.
pub fn assemble_with_context(
    persona: &Persona,
    context: &ProjectContext,
    is_initial: bool,
) -> String {
    let title = context
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(UNTITLED);
    let requirements_json =
        serde_json::to_string(&context.requirements).unwrap_or_else(|_| "{}".to_string());

    // A present title means the user just finished the provisioning form;
    // otherwise the model opens as if meeting the user for the first time.
    let stage = if title == UNTITLED {
        "초기 진입 상태"
    } else {
        "STEP 1 단계를 막 마친 상태"
    };

    let mut instruction = format!(
        "{template}\n\n[전문가 페르소나]\n{persona_prompt}\n\n\
         [현재 프로젝트 컨텍스트]\n- 프로젝트명: {title}\n- 사용자 초기 정보: {requirements}\n\n\
         현재 사용자는 {stage}입니다.\n위의 운영 규칙에 따라 대화를 시작하거나 이어나가세요.",
        template = SYSTEM_PROMPT_TEMPLATE,
        persona_prompt = persona.prompt,
        title = title,
        requirements = requirements_json,
        stage = stage,
    );

    if is_initial {
        instruction.push_str("\n사용자가 방금 프로젝트를 생성했습니다. 먼저 인사를 건네며 대화를 시작하세요.");
    }

    instruction
}

fn fetch_context(db: &Database, project_id: &str) -> ProjectContext {
    let id = match Uuid::parse_str(project_id) {
        Ok(id) => id,
        Err(_) => {
            tracing::warn!("Malformed project id {:?}, assembling with defaults", project_id);
            return ProjectContext::default();
        }
    };

    match db.get_project_context(id) {
        Ok(Some(context)) => context,
        Ok(None) => {
            tracing::warn!(%id, "Project not found, assembling with defaults");
            ProjectContext::default()
        }
        Err(e) => {
            tracing::warn!(%id, error = %e, "Project context read failed, assembling with defaults");
            ProjectContext::default()
        }
    }
}
