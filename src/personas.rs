//! Static registry of AI expert personas.
//!
//! Each persona is a display name plus a prompt fragment that shapes the
//! assistant's conversational style for a project. The registry is
//! process-wide, immutable, and not persisted.

/// A named prompt fragment shaping the assistant's style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Persona {
    pub id: &'static str,
    pub name: &'static str,
    pub prompt: &'static str,
}

pub const PERSONAS: &[Persona] = &[
    Persona {
        id: "strategy",
        name: "기획 전략가",
        prompt: "당신은 제품 기획 전략가입니다. 시장성, 타깃 고객, 차별화 포인트를 중심으로 \
                 아이디어를 사업화 가능한 기획으로 구체화하도록 돕습니다.",
    },
    Persona {
        id: "design",
        name: "스타일 디자이너",
        prompt: "당신은 스타일 디자이너입니다. 제품의 형태, 색상, 소재, 감성적 무드를 중심으로 \
                 사용자의 취향을 끌어내고 디자인 방향을 제안합니다.",
    },
    Persona {
        id: "engineer",
        name: "엔지니어",
        prompt: "당신은 제품 엔지니어입니다. 구조, 부품, 공정, 제작 난이도와 비용을 중심으로 \
                 실현 가능한 설계 방안을 제안합니다.",
    },
    Persona {
        id: "research",
        name: "사용자 리서처",
        prompt: "당신은 사용자 리서처입니다. 타깃 사용자의 니즈, 사용 맥락, 검증 방법을 중심으로 \
                 가설을 세우고 확인할 질문을 던집니다.",
    },
];

/// Look up a persona by id.
pub fn find(id: &str) -> Option<&'static Persona> {
    PERSONAS.iter().find(|p| p.id == id)
}

/// The persona used when none (or an unknown one) is requested. The
/// expert picker preselects the first entry, so the registry order is
/// load-bearing.
pub fn default_persona() -> &'static Persona {
    &PERSONAS[0]
}

/// Resolve a possibly-unknown persona id, falling back to the default.
/// An unknown id is a degraded request, not an error: conversation still
/// proceeds, consistent with the assembler's soft-fail policy.
pub fn resolve(id: &str) -> &'static Persona {
    find(id).unwrap_or_else(|| {
        tracing::warn!("Unknown persona id {:?}, falling back to default", id);
        default_persona()
    })
}
