//! Model gateway and web search clients.
//!
//! This crate holds the upstream-facing surface of the system: the
//! [`ChatGateway`] trait with its OpenAI-compatible implementation, and the
//! [`SearchClient`] trait with its Serper implementation. Conversation
//! orchestration lives elsewhere and depends only on the traits.

pub mod chat;
pub mod error;
pub mod gateway;
pub mod search;
pub mod sse;

pub use chat::{ChatMessage, ChatRole, Decision, ToolCallRequest, ToolSpec};
pub use error::{GatewayError, SearchError};
pub use gateway::{ChatGateway, OpenAiGateway, OpenAiGatewayConfig, ReplyStream};
pub use search::{SearchClient, SearchResult, SerperConfig, SerperSearch, RESULT_CAP};
