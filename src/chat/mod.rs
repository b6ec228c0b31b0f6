//! The client-side half of the conversation pipeline: turn persistence and
//! the controller state machine that drives one turn at a time.

mod controller;
mod persistence;

pub use controller::{ChatController, ControllerState, Entry, TurnOutcome};
pub use persistence::TurnStore;
