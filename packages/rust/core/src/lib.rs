//! Conversation engine for larder.
//!
//! This crate ties the catalog, the ranker and the intent classifier
//! together into a per-session state machine:
//! - [`transition()`] is the pure `(node, event) -> (node, effect)` table
//! - [`ConversationGraph`] drives one turn through that table
//! - [`SessionManager`] serves many sessions over one shared graph

mod graph;
mod instructions;
mod manager;
mod node;
mod payload;
mod session;
#[cfg(test)]
mod testing;
mod transition;

pub use graph::{ConversationGraph, GraphConfig, SilentProgress, TurnProgress};
pub use instructions::InstructionRenderer;
pub use manager::SessionManager;
pub use node::{Node, UnknownNode};
pub use payload::{ClarificationReason, DisplayPayload, TurnResult};
pub use session::{SessionState, Speaker, Turn};
pub use transition::{Effect, Event, InvalidTransition, Transition, is_valid_transition, transition};
