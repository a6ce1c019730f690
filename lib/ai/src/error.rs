//! Error types for the AI crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `GatewayError`: Model gateway transport/protocol failures
//! - `SearchError`: Web search API failures

use std::fmt;

/// Errors from model gateway operations.
///
/// Gateway failures are non-retriable within a turn: the caller surfaces them
/// to the client rather than silently retrying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Transport or HTTP failure talking to the upstream model endpoint.
    /// Timeouts land here with no status code.
    Upstream {
        status: Option<u16>,
        message: String,
    },
    /// Response parsing failed.
    ResponseParseFailed { reason: String },
    /// Invalid gateway configuration.
    InvalidConfig { reason: String },
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upstream { status, message } => match status {
                Some(code) => write!(f, "model upstream failed ({code}): {message}"),
                None => write!(f, "model upstream failed: {message}"),
            },
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse model response: {reason}")
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid gateway configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for GatewayError {}

/// Errors from search API operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Transport or HTTP failure talking to the search endpoint.
    Upstream {
        status: Option<u16>,
        message: String,
    },
    /// Response parsing failed.
    ResponseParseFailed { reason: String },
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upstream { status, message } => match status {
                Some(code) => write!(f, "search upstream failed ({code}): {message}"),
                None => write!(f, "search upstream failed: {message}"),
            },
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse search response: {reason}")
            }
        }
    }
}

impl std::error::Error for SearchError {}
