use anyhow::Result;
use uuid::Uuid;

use crate::db::Database;
use crate::models::{Message, Role};

/// Turn persistence against the message store.
///
/// Both appends are single inserts; no transaction spans the user and
/// assistant writes, and none spans an insert and the relay call. A crash
/// between the two leaves a dangling user turn with no reply — an accepted,
/// unrecovered failure mode.
pub trait TurnStore: Send + Sync {
    /// Rebuild the transcript for a project, oldest first.
    fn load_transcript(&self, project_id: Uuid) -> Result<Vec<Message>>;

    /// Persist the user half of a turn. Attempted before the relay call.
    fn append_user_turn(&self, project_id: Uuid, content: &str) -> Result<Message>;

    /// Persist the assistant half of a turn. Invoked exactly once per
    /// cleanly completed stream, with the fully concatenated text — never
    /// incrementally.
    fn append_assistant_turn(&self, project_id: Uuid, content: &str) -> Result<Message>;
}

impl TurnStore for Database {
    fn load_transcript(&self, project_id: Uuid) -> Result<Vec<Message>> {
        self.get_messages(project_id)
    }

    fn append_user_turn(&self, project_id: Uuid, content: &str) -> Result<Message> {
        self.append_message(project_id, Role::User, content)
    }

    fn append_assistant_turn(&self, project_id: Uuid, content: &str) -> Result<Message> {
        self.append_message(project_id, Role::Assistant, content)
    }
}
