//! Core domain types and utilities for the canvasmith platform.
//!
//! This crate provides the foundational types, error handling, and shared
//! utilities used throughout the canvasmith conversational extraction backend.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{CanvasRecordId, ConversationId, ParseIdError, TurnId, UserId};
