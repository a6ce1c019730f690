//! Error types for the canvas crate.

use canvasmith_core::CanvasRecordId;
use std::fmt;

/// Errors from canvas record operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvasError {
    /// Record not found, or not owned by the caller.
    NotFound { id: CanvasRecordId },
    /// Field list failed validation.
    InvalidFields { reason: String },
    /// Storage operation failed.
    StorageFailed { reason: String },
}

impl fmt::Display for CanvasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "canvas record not found: {id}"),
            Self::InvalidFields { reason } => {
                write!(f, "invalid canvas fields: {reason}")
            }
            Self::StorageFailed { reason } => {
                write!(f, "canvas storage failed: {reason}")
            }
        }
    }
}

impl std::error::Error for CanvasError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let id = CanvasRecordId::new();
        let err = CanvasError::NotFound { id };
        assert!(err.to_string().contains("canvas record not found"));
    }

    #[test]
    fn storage_failed_display() {
        let err = CanvasError::StorageFailed {
            reason: "connection reset".to_string(),
        };
        assert!(err.to_string().contains("connection reset"));
    }
}
