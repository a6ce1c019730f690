//! Error types for conversation storage.

use std::fmt;

/// Errors from conversation and turn storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The storage backend failed.
    Backend { reason: String },
    /// A stored row could not be decoded.
    Corrupt { reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend { reason } => write!(f, "conversation storage failed: {reason}"),
            Self::Corrupt { reason } => write!(f, "stored conversation data is corrupt: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}
