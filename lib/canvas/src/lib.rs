//! Canvas record entity for the canvasmith platform.
//!
//! This crate provides:
//!
//! - **Canvas Record**: the structured artifact (ordered tagged fields)
//!   incrementally built from conversation
//! - **Canvas Store**: the storage contract shared by the tool layer and the
//!   record read endpoints

pub mod error;
pub mod record;
pub mod store;

pub use error::CanvasError;
pub use record::{CanvasField, CanvasRecord};
pub use store::CanvasStore;
