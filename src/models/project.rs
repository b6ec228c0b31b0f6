use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Requirements;

/// How many characters of the idea text become the project title.
const TITLE_MAX_CHARS: usize = 15;

/// A user-owned planning session.
///
/// Created once through the provisioning flow. The requirements document is
/// write-once: there is no update path, only the chat transcript grows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub user_id: String,
    pub title: Option<String>,
    pub requirements: Requirements,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a project from a completed provisioning form.
///
/// The title is not supplied by the caller; it is summarized from the idea
/// text at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectInput {
    pub requirements: Requirements,
}

/// The slice of a project the prompt assembler reads: title and
/// requirements, nothing else.
#[derive(Debug, Clone, Default)]
pub struct ProjectContext {
    pub title: Option<String>,
    pub requirements: Requirements,
}

/// Summarize an idea text into a project title.
///
/// Character-based, not byte-based: titles are typically Korean and a byte
/// slice would split a code point.
pub fn summarize_title(idea: &str) -> String {
    if idea.chars().count() > TITLE_MAX_CHARS {
        let head: String = idea.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        idea.to_string()
    }
}
