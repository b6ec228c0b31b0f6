//! Aidee — AI-assisted product planning over chat.
//!
//! The server owns four concerns: the project/message store ([`db`]), the
//! persona registry and prompt assembly ([`personas`], [`prompt`]), the
//! streaming inference relay ([`llm`]), and the HTTP surface plus identity
//! glue ([`api`], [`auth`]). The [`chat`] module is the client-side turn
//! controller driving all of them for one conversation.

pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod db;
pub mod llm;
pub mod models;
pub mod personas;
pub mod prompt;
