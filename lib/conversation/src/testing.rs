//! In-memory test doubles for the store and gateway traits.

use crate::error::StoreError;
use crate::store::{Conversation, ConversationStore, TurnStore};
use crate::turn::Turn;
use async_trait::async_trait;
use canvasmith_ai::{
    ChatGateway, ChatMessage, Decision, GatewayError, ReplyStream, SearchClient, SearchError,
    SearchResult, ToolSpec,
};
use canvasmith_canvas::{CanvasError, CanvasField, CanvasRecord, CanvasStore};
use canvasmith_core::{CanvasRecordId, ConversationId, UserId};
use chrono::Utc;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::Mutex as SyncMutex;
use tokio::sync::Mutex;

#[derive(Default)]
pub(crate) struct MemoryCanvasStore {
    records: Mutex<Vec<CanvasRecord>>,
}

impl MemoryCanvasStore {
    pub(crate) async fn get(&self, id: CanvasRecordId) -> Option<CanvasRecord> {
        self.records
            .lock()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    pub(crate) async fn all(&self) -> Vec<CanvasRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl CanvasStore for MemoryCanvasStore {
    async fn create(&self, record: &CanvasRecord) -> Result<(), CanvasError> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: CanvasRecordId) -> Result<Option<CanvasRecord>, CanvasError> {
        Ok(self.get(id).await)
    }

    async fn list_public(&self) -> Result<Vec<CanvasRecord>, CanvasError> {
        let mut records: Vec<CanvasRecord> = self
            .records
            .lock()
            .await
            .iter()
            .filter(|r| r.public)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn replace_fields(
        &self,
        id: CanvasRecordId,
        owner: UserId,
        fields: Vec<CanvasField>,
    ) -> Result<CanvasRecord, CanvasError> {
        let mut records = self.records.lock().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id && r.user_id == owner)
            .ok_or(CanvasError::NotFound { id })?;
        record.replace_fields(fields);
        Ok(record.clone())
    }

    async fn set_public(
        &self,
        id: CanvasRecordId,
        owner: UserId,
        public: bool,
    ) -> Result<CanvasRecord, CanvasError> {
        let mut records = self.records.lock().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id && r.user_id == owner)
            .ok_or(CanvasError::NotFound { id })?;
        record.set_public(public);
        Ok(record.clone())
    }
}

#[derive(Default)]
pub(crate) struct MemoryConversationStore {
    rows: Mutex<Vec<Conversation>>,
}

impl MemoryConversationStore {
    pub(crate) async fn all(&self) -> Vec<Conversation> {
        self.rows.lock().await.clone()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError> {
        self.rows.lock().await.push(conversation.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ConversationId) -> Result<Option<Conversation>, StoreError> {
        Ok(self.rows.lock().await.iter().find(|c| c.id == id).cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Conversation>, StoreError> {
        let mut rows: Vec<Conversation> = self
            .rows
            .lock()
            .await
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows)
    }

    async fn touch(&self, id: ConversationId) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().await;
        if let Some(row) = rows.iter_mut().find(|c| c.id == id) {
            row.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemoryTurnStore {
    rows: Mutex<Vec<Turn>>,
}

#[async_trait]
impl TurnStore for MemoryTurnStore {
    async fn append(&self, turn: &Turn) -> Result<(), StoreError> {
        self.rows.lock().await.push(turn.clone());
        Ok(())
    }

    async fn list_for_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Turn>, StoreError> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .filter(|t| t.conversation_id == conversation_id)
            .cloned()
            .collect())
    }
}

/// One scripted final-stream behavior.
pub(crate) enum ScriptedReply {
    /// Yield these fragments, then end.
    Fragments(Vec<String>),
    /// Yield fragments, then fail mid-stream.
    FragmentsThenError(Vec<String>, GatewayError),
    /// Never yield anything; the stream stays open.
    Hang,
}

impl ScriptedReply {
    pub(crate) fn fragments<S: Into<String>>(parts: impl IntoIterator<Item = S>) -> Self {
        Self::Fragments(parts.into_iter().map(Into::into).collect())
    }
}

/// Gateway double replaying queued decisions and replies.
///
/// An exhausted decision queue yields empty text decisions; an exhausted
/// reply queue yields empty streams.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    decisions: SyncMutex<VecDeque<Decision>>,
    replies: SyncMutex<VecDeque<ScriptedReply>>,
    contexts: SyncMutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedGateway {
    pub(crate) fn push_decision(&self, decision: Decision) {
        self.decisions.lock().unwrap().push_back(decision);
    }

    pub(crate) fn push_reply(&self, reply: ScriptedReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Contexts passed to `decide`, in call order.
    pub(crate) fn seen_contexts(&self) -> Vec<Vec<ChatMessage>> {
        self.contexts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatGateway for ScriptedGateway {
    async fn decide(
        &self,
        context: &[ChatMessage],
        _tools: &[ToolSpec],
    ) -> Result<Decision, GatewayError> {
        self.contexts.lock().unwrap().push(context.to_vec());
        Ok(self
            .decisions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Decision::Text(String::new())))
    }

    async fn stream_final(&self, _context: &[ChatMessage]) -> Result<ReplyStream, GatewayError> {
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ScriptedReply::Fragments(Vec::new()));

        Ok(match reply {
            ScriptedReply::Fragments(parts) => {
                futures::stream::iter(parts.into_iter().map(Ok)).boxed()
            }
            ScriptedReply::FragmentsThenError(parts, err) => {
                let items: Vec<Result<String, GatewayError>> =
                    parts.into_iter().map(Ok).chain([Err(err)]).collect();
                futures::stream::iter(items).boxed()
            }
            ScriptedReply::Hang => futures::stream::pending().boxed(),
        })
    }
}

/// Search double returning a fixed result list.
#[derive(Default)]
pub(crate) struct StubSearch {
    pub(crate) results: Vec<SearchResult>,
}

#[async_trait]
impl SearchClient for StubSearch {
    async fn search(&self, _query: &str) -> Result<Vec<SearchResult>, SearchError> {
        Ok(self.results.clone())
    }
}

/// Search double that always fails upstream.
pub(crate) struct FailingSearch;

#[async_trait]
impl SearchClient for FailingSearch {
    async fn search(&self, _query: &str) -> Result<Vec<SearchResult>, SearchError> {
        Err(SearchError::Upstream {
            status: Some(503),
            message: "service unavailable".to_string(),
        })
    }
}
