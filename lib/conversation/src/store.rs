//! Storage contracts for conversations and their turn logs.

use crate::error::StoreError;
use crate::turn::Turn;
use async_trait::async_trait;
use canvasmith_core::{ConversationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of characters kept from the opening message as a title.
pub const TITLE_MAX_CHARS: usize = 50;

/// A conversation: an owned, titled container for an append-only turn log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation identifier.
    pub id: ConversationId,
    /// The user who owns this conversation.
    pub user_id: UserId,
    /// Title derived from the opening message.
    pub title: String,
    /// When the conversation was created.
    pub created_at: DateTime<Utc>,
    /// When the conversation last completed a turn.
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Creates a new conversation titled after the opening message.
    #[must_use]
    pub fn new(user_id: UserId, first_message: &str) -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            user_id,
            title: derive_title(first_message),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Derives a conversation title from the opening message.
#[must_use]
pub fn derive_title(first_message: &str) -> String {
    first_message.trim().chars().take(TITLE_MAX_CHARS).collect()
}

/// Trait for conversation storage.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Persists a new conversation.
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError>;

    /// Fetches a conversation by ID.
    async fn find_by_id(&self, id: ConversationId) -> Result<Option<Conversation>, StoreError>;

    /// Lists a user's conversations, most recently updated first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Conversation>, StoreError>;

    /// Bumps a conversation's `updated_at` to now.
    async fn touch(&self, id: ConversationId) -> Result<(), StoreError>;
}

/// Trait for turn log storage.
///
/// The log is append-only; turns are never rewritten or deleted.
#[async_trait]
pub trait TurnStore: Send + Sync {
    /// Appends a turn to its conversation's log.
    async fn append(&self, turn: &Turn) -> Result<(), StoreError>;

    /// Lists a conversation's turns in creation order, oldest first.
    async fn list_for_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Turn>, StoreError>;
}
