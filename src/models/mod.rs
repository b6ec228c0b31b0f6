//! Domain models for Aidee.
//!
//! # Core Concepts
//!
//! - [`Project`]: A user-owned planning session. Created once through the
//!   provisioning flow; its [`Requirements`] document is write-once at
//!   creation and read by the prompt assembler.
//! - [`Message`]: One entry in a project's transcript. Messages form a
//!   strictly time-ordered, append-only sequence; nothing in this crate
//!   ever mutates or deletes one.
//! - [`Requirements`]: The typed view of the multi-step provisioning form
//!   (goal, categories, budget range, size, features, duration, usage,
//!   free-text idea). Stored as a JSON document for flexibility, exposed
//!   typed everywhere else.

mod message;
mod project;
mod requirements;

pub use message::*;
pub use project::*;
pub use requirements::*;
