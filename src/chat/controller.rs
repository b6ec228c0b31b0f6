//! The conversation controller: owns the in-memory transcript for one
//! project view and drives the turn loop (persist user turn, invoke the
//! relay, render chunks, finalize the assistant turn).
//!
//! One turn at a time: concurrent submissions are prevented by the
//! `Sending`/`Streaming` guard, not by locking. There is no cancellation —
//! the only way out of a stuck stream is the error path back to `Idle`,
//! which leaves the partial entry visibly incomplete.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use super::TurnStore;
use crate::llm::{ChatMessage, ChatModel, RelayRequest};
use crate::models::Role;

/// Controller lifecycle for one project view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Fetching the transcript from the store.
    Loading,
    /// Awaiting input.
    Idle,
    /// User turn persisted, relay invoked, waiting for the first chunk.
    Sending,
    /// Chunks arriving; the trailing assistant entry grows in place.
    Streaming,
}

/// How a submission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Guard rejected the submission: no state transition, no side effect.
    Rejected,
    /// Stream consumed to the end; assistant turn persisted.
    Completed,
    /// Stream failed; partial entry left as-is, nothing persisted.
    Failed,
}

/// One transcript entry as held in memory. Optimistic entries exist here
/// before (or without) a store-side counterpart; the store remains the
/// source of truth.
#[derive(Debug, Clone)]
pub struct Entry {
    pub role: Role,
    pub content: String,
}

pub struct ChatController {
    /// None when the view was opened with a malformed project id; the view
    /// then shows an empty, non-erroring transcript.
    project_id: Option<Uuid>,
    state: ControllerState,
    transcript: Vec<Entry>,
}

impl ChatController {
    pub fn new(project_id: &str) -> Self {
        let project_id = Uuid::parse_str(project_id).ok();
        if project_id.is_none() {
            warn!("Opened chat view with malformed project id");
        }
        Self {
            project_id,
            state: ControllerState::Loading,
            transcript: Vec::new(),
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn transcript(&self) -> &[Entry] {
        &self.transcript
    }

    /// Rebuild the transcript from the store. Read failures degrade to an
    /// empty transcript; the view still becomes usable.
    pub fn load(&mut self, store: &dyn TurnStore) {
        self.transcript.clear();
        if let Some(id) = self.project_id {
            match store.load_transcript(id) {
                Ok(messages) => {
                    self.transcript = messages
                        .into_iter()
                        .map(|m| Entry {
                            role: m.role,
                            content: m.content,
                        })
                        .collect();
                }
                Err(e) => warn!(error = %e, "Transcript load failed, starting empty"),
            }
        }
        self.state = ControllerState::Idle;
    }

    /// Guarded entry into a turn. Returns false — with no state transition
    /// and no side effect — for blank input or when a turn is already in
    /// flight; otherwise appends the optimistic user entry and moves to
    /// `Sending`.
    fn begin_submit(&mut self, input: &str) -> bool {
        if self.state != ControllerState::Idle || input.trim().is_empty() {
            return false;
        }
        self.transcript.push(Entry {
            role: Role::User,
            content: input.to_string(),
        });
        self.state = ControllerState::Sending;
        true
    }

    /// Run one full turn: persist the user message, relay the history with
    /// the assembled instruction, stream the reply into a placeholder, and
    /// persist the assistant message once the stream completes cleanly.
    pub async fn run_turn(
        &mut self,
        store: &dyn TurnStore,
        model: Arc<dyn ChatModel>,
        instruction: &str,
        input: &str,
    ) -> TurnOutcome {
        if !self.begin_submit(input) {
            return TurnOutcome::Rejected;
        }

        // User-turn persistence comes before the relay call. A failed write
        // leaves the message visible in the transcript but absent from the
        // store — accepted inconsistency, not a blocking error.
        if let Some(id) = self.project_id {
            if let Err(e) = store.append_user_turn(id, input) {
                warn!(error = %e, "User turn persistence failed");
            }
        }

        let history = self
            .transcript
            .iter()
            .map(|e| ChatMessage {
                role: e.role,
                content: e.content.clone(),
            })
            .collect();

        self.stream_reply(store, model, instruction, history).await
    }

    /// The `Initial` variant for freshly created projects: with an empty
    /// transcript and the one-time flag set, synthesize a turn with empty
    /// history so the assistant greets first.
    pub async fn run_initial_greeting(
        &mut self,
        store: &dyn TurnStore,
        model: Arc<dyn ChatModel>,
        instruction: &str,
    ) -> TurnOutcome {
        if self.state != ControllerState::Idle || !self.transcript.is_empty() {
            return TurnOutcome::Rejected;
        }
        self.state = ControllerState::Sending;
        self.stream_reply(store, model, instruction, Vec::new()).await
    }

    async fn stream_reply(
        &mut self,
        store: &dyn TurnStore,
        model: Arc<dyn ChatModel>,
        instruction: &str,
        history: Vec<ChatMessage>,
    ) -> TurnOutcome {
        // Placeholder appended the instant the relay call is issued, then
        // mutated in place as chunks arrive.
        self.transcript.push(Entry {
            role: Role::Assistant,
            content: String::new(),
        });
        let placeholder = self.transcript.len() - 1;

        let request = RelayRequest {
            system_instruction: instruction.to_string(),
            history,
        };
        let (tx, mut rx) = mpsc::channel(32);
        let relay = tokio::spawn(async move { model.stream(request, tx).await });

        while let Some(chunk) = rx.recv().await {
            if self.state == ControllerState::Sending {
                self.state = ControllerState::Streaming;
            }
            self.transcript[placeholder].content.push_str(&chunk);
        }

        let outcome = match relay.await {
            Ok(Ok(())) => {
                // Clean completion: the assistant turn is persisted exactly
                // once, with the fully concatenated text.
                if let Some(id) = self.project_id {
                    let content = self.transcript[placeholder].content.clone();
                    if let Err(e) = store.append_assistant_turn(id, &content) {
                        warn!(error = %e, "Assistant turn persistence failed");
                    }
                }
                TurnOutcome::Completed
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Relay stream failed");
                TurnOutcome::Failed
            }
            Err(e) => {
                warn!(error = %e, "Relay task panicked");
                TurnOutcome::Failed
            }
        };

        self.state = ControllerState::Idle;
        outcome
    }
}
