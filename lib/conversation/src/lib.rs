//! Conversation orchestration.
//!
//! This crate owns the heart of the system: the append-only turn log, the
//! pure history reconstruction that derives gateway context and the active
//! canvas record from it, the closed tool vocabulary with its dispatcher,
//! and the turn orchestrator that ties log, gateway, and tools together into
//! a streaming turn. Storage and the HTTP surface plug in through the traits
//! defined here and in the canvas and ai crates.

pub mod error;
pub mod history;
pub mod orchestrator;
pub mod store;
pub mod tool;
pub mod turn;

#[cfg(test)]
pub(crate) mod testing;

pub use error::StoreError;
pub use history::{reconstruct, History};
pub use orchestrator::{
    TurnError, TurnFrame, TurnInput, TurnOrchestrator, DEFAULT_SYSTEM_PROMPT,
};
pub use store::{derive_title, Conversation, ConversationStore, TurnStore, TITLE_MAX_CHARS};
pub use tool::{
    tool_specs, ToolDispatcher, ToolOutcome, ToolParseError, ToolRequest, SAVE_CANVAS,
    UPDATE_CANVAS, WEB_SEARCH,
};
pub use turn::{ParseTurnRoleError, Turn, TurnRole};
