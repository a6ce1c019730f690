//! Turn orchestration.
//!
//! A turn runs as one logical task: load and validate, ask the gateway for a
//! decision, execute any requested tools, then stream the final reply while
//! persisting what the log needs to replay the turn later. Failures before
//! the stream starts surface as [`TurnError`]; after the first fragment they
//! become an in-stream error frame.

use crate::error::StoreError;
use crate::history::reconstruct;
use crate::store::{Conversation, ConversationStore, TurnStore};
use crate::tool::{tool_specs, ToolDispatcher};
use crate::turn::Turn;
use canvasmith_ai::{ChatGateway, ChatMessage, Decision, GatewayError, SearchClient};
use canvasmith_canvas::CanvasStore;
use canvasmith_core::{ConversationId, UserId};
use futures::StreamExt;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// System prompt used when the deployment configures none.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a business coach helping the user develop a business model canvas \
through conversation. Ask focused questions, one aspect at a time, and keep \
track of what has been established. When enough aspects are known, save the \
canvas with the save_canvas tool; when the user revises an aspect of an \
already saved canvas, use update_canvas with the full field list. Use \
web_search when current market information would help. Reply in the user's \
language.";

/// Frames emitted over a turn's output stream.
///
/// Serializes with camelCase keys: `{"chunk", "conversationId", "isNewChat"}`
/// for fragments, `{"error"}` for failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TurnFrame {
    /// A reply fragment.
    #[serde(rename_all = "camelCase")]
    Chunk {
        chunk: String,
        conversation_id: ConversationId,
        is_new_chat: bool,
    },
    /// A mid-stream failure; the stream closes after this frame.
    Error { error: String },
}

/// Input for one turn.
#[derive(Debug, Clone)]
pub struct TurnInput {
    /// The authenticated caller.
    pub user_id: UserId,
    /// Target conversation; `None` starts a new one.
    pub conversation_id: Option<ConversationId>,
    /// The user's message.
    pub message: String,
}

/// Failures that abort a turn before any output is produced.
#[derive(Debug)]
pub enum TurnError {
    /// The message was empty after trimming.
    EmptyMessage,
    /// The conversation does not exist or belongs to another user.
    NotFound { id: ConversationId },
    /// The model gateway failed.
    Gateway { source: GatewayError },
    /// Persistence failed.
    Store { source: StoreError },
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "message must not be empty"),
            Self::NotFound { id } => write!(f, "conversation not found: {id}"),
            Self::Gateway { source } => write!(f, "model gateway failed: {source}"),
            Self::Store { source } => write!(f, "persistence failed: {source}"),
        }
    }
}

impl std::error::Error for TurnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gateway { source } => Some(source),
            Self::Store { source } => Some(source),
            _ => None,
        }
    }
}

impl From<StoreError> for TurnError {
    fn from(source: StoreError) -> Self {
        Self::Store { source }
    }
}

impl From<GatewayError> for TurnError {
    fn from(source: GatewayError) -> Self {
        Self::Gateway { source }
    }
}

/// Runs turns against the stores and the model gateway.
///
/// Turns for the same conversation are serialized through a keyed async
/// mutex: a second concurrent turn waits for the first to finish persisting.
pub struct TurnOrchestrator {
    conversations: Arc<dyn ConversationStore>,
    turns: Arc<dyn TurnStore>,
    canvas: Arc<dyn CanvasStore>,
    gateway: Arc<dyn ChatGateway>,
    search: Arc<dyn SearchClient>,
    system_prompt: String,
    locks: Mutex<HashMap<ConversationId, Arc<Mutex<()>>>>,
}

impl TurnOrchestrator {
    /// Creates an orchestrator with the default system prompt.
    #[must_use]
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        turns: Arc<dyn TurnStore>,
        canvas: Arc<dyn CanvasStore>,
        gateway: Arc<dyn ChatGateway>,
        search: Arc<dyn SearchClient>,
    ) -> Self {
        Self {
            conversations,
            turns,
            canvas,
            gateway,
            search,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Overrides the system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    async fn lock_for(&self, id: ConversationId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        // An entry whose Arc only the map holds belongs to a finished turn;
        // sweeping here keeps the map bounded by in-flight conversations.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(id).or_default())
    }

    #[cfg(test)]
    async fn tracked_locks(&self) -> Vec<ConversationId> {
        self.locks.lock().await.keys().copied().collect()
    }

    /// Runs one turn and returns its frame stream.
    ///
    /// Decision and tool execution complete before this returns, so every
    /// failure that would map to an HTTP status happens here. The returned
    /// receiver yields reply fragments as the final stream arrives; dropping
    /// it stops consumption of the upstream stream, and the text accumulated
    /// up to that point is still persisted.
    ///
    /// # Errors
    ///
    /// [`TurnError::EmptyMessage`] for a blank message, [`TurnError::NotFound`]
    /// for a missing or foreign conversation, [`TurnError::Gateway`] /
    /// [`TurnError::Store`] for upstream and persistence failures.
    pub async fn start(&self, input: TurnInput) -> Result<mpsc::Receiver<TurnFrame>, TurnError> {
        let message = input.message.trim().to_string();
        if message.is_empty() {
            return Err(TurnError::EmptyMessage);
        }

        let (conversation, is_new_chat) = match input.conversation_id {
            Some(id) => {
                let conversation = self
                    .conversations
                    .find_by_id(id)
                    .await?
                    // Foreign conversations are indistinguishable from missing
                    // ones to avoid leaking their existence.
                    .filter(|c| c.user_id == input.user_id)
                    .ok_or(TurnError::NotFound { id })?;
                (conversation, false)
            }
            None => {
                let conversation = Conversation::new(input.user_id, &message);
                self.conversations.create(&conversation).await?;
                (conversation, true)
            }
        };

        let lock = self.lock_for(conversation.id).await;
        let guard = lock.lock_owned().await;

        let prior = self.turns.list_for_conversation(conversation.id).await?;
        let history = reconstruct(&prior);

        let mut context = Vec::with_capacity(history.messages.len() + 3);
        context.push(ChatMessage::system(self.system_prompt.clone()));
        if let Some(record_id) = history.active_record {
            context.push(ChatMessage::system(format!(
                "This conversation already produced canvas record {record_id}. \
                 Use update_canvas with this record_id instead of saving a new \
                 record."
            )));
        }
        context.extend(history.messages);
        context.push(ChatMessage::user(message.clone()));

        self.turns
            .append(&Turn::user(conversation.id, &message))
            .await?;

        let decision = self.gateway.decide(&context, &tool_specs()).await?;

        if let Decision::ToolCalls { content, calls } = decision {
            // The request turn goes in before execution so the log stays
            // replayable even if execution is interrupted.
            self.turns
                .append(&Turn::assistant_tool_calls(
                    conversation.id,
                    content.clone(),
                    calls.clone(),
                ))
                .await?;
            context.push(ChatMessage::assistant_tool_calls(content, calls.clone()));

            let dispatcher = ToolDispatcher::new(self.canvas.as_ref(), self.search.as_ref());
            for call in &calls {
                let outcome = dispatcher
                    .dispatch(input.user_id, &call.name, &call.arguments)
                    .await;
                let payload = outcome.to_payload().to_string();
                self.turns
                    .append(&Turn::tool(conversation.id, &call.id, &payload))
                    .await?;
                context.push(ChatMessage::tool(call.id.clone(), payload));
            }
        }

        let reply = self.gateway.stream_final(&context).await?;

        let (tx, rx) = mpsc::channel(32);
        let turns = Arc::clone(&self.turns);
        let conversations = Arc::clone(&self.conversations);
        let conversation_id = conversation.id;

        tokio::spawn(async move {
            // Held until the turn is fully persisted.
            let _guard = guard;
            let mut reply = reply;
            let mut accumulated = String::new();

            while let Some(next) = reply.next().await {
                match next {
                    Ok(fragment) => {
                        accumulated.push_str(&fragment);
                        let frame = TurnFrame::Chunk {
                            chunk: fragment,
                            conversation_id,
                            is_new_chat,
                        };
                        // Send failure means the consumer disconnected; stop
                        // draining and keep what arrived so far.
                        if tx.send(frame).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx
                            .send(TurnFrame::Error {
                                error: e.to_string(),
                            })
                            .await;
                        break;
                    }
                }
            }
            // Releases the upstream connection before persisting.
            drop(reply);

            if !accumulated.is_empty() {
                if let Err(e) = turns
                    .append(&Turn::assistant(conversation_id, &accumulated))
                    .await
                {
                    tracing::error!(
                        conversation = %conversation_id,
                        error = %e,
                        "failed to persist assistant turn",
                    );
                }
                if let Err(e) = conversations.touch(conversation_id).await {
                    tracing::error!(
                        conversation = %conversation_id,
                        error = %e,
                        "failed to bump conversation timestamp",
                    );
                }
            }
        });

        Ok(rx)
    }
}
