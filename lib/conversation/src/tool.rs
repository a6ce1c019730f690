//! Tool requests, outcomes, and dispatch.
//!
//! The tool surface is a closed enum: the three tools below are the entire
//! vocabulary, checked at compile time. Anything else the model asks for
//! becomes an error outcome, which is model-visible data rather than a turn
//! failure.

use canvasmith_ai::{SearchClient, SearchResult, ToolSpec};
use canvasmith_canvas::{CanvasError, CanvasField, CanvasRecord, CanvasStore};
use canvasmith_core::{CanvasRecordId, UserId};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::fmt;

/// Wire name of the create tool.
pub const SAVE_CANVAS: &str = "save_canvas";
/// Wire name of the update tool.
pub const UPDATE_CANVAS: &str = "update_canvas";
/// Wire name of the search tool.
pub const WEB_SEARCH: &str = "web_search";

/// A validated tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    /// Create a new canvas record from the given fields.
    CreateCanvas { fields: Vec<CanvasField> },
    /// Replace the full field list of an existing record.
    UpdateCanvas {
        record_id: CanvasRecordId,
        fields: Vec<CanvasField>,
    },
    /// Run a web search.
    WebSearch { query: String },
}

/// Error turning a model-issued invocation into a [`ToolRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolParseError {
    /// The tool name is not in the vocabulary.
    UnknownTool { name: String },
    /// The arguments do not match the tool's schema.
    InvalidArguments { tool: String, reason: String },
}

impl fmt::Display for ToolParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTool { name } => write!(f, "unknown tool: {name}"),
            Self::InvalidArguments { tool, reason } => {
                write!(f, "invalid arguments for {tool}: {reason}")
            }
        }
    }
}

impl std::error::Error for ToolParseError {}

#[derive(Debug, Deserialize)]
struct SaveArgs {
    fields: Vec<CanvasField>,
}

#[derive(Debug, Deserialize)]
struct UpdateArgs {
    record_id: String,
    fields: Vec<CanvasField>,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

impl ToolRequest {
    /// Parses a model-issued `(name, arguments)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`ToolParseError`] for unknown names or malformed arguments.
    /// Callers degrade this to an error outcome; it never aborts a turn.
    pub fn parse(name: &str, arguments: &JsonValue) -> Result<Self, ToolParseError> {
        let invalid = |reason: String| ToolParseError::InvalidArguments {
            tool: name.to_string(),
            reason,
        };

        match name {
            SAVE_CANVAS => {
                let args: SaveArgs = serde_json::from_value(arguments.clone())
                    .map_err(|e| invalid(e.to_string()))?;
                if args.fields.is_empty() {
                    return Err(invalid("fields must not be empty".to_string()));
                }
                Ok(Self::CreateCanvas {
                    fields: args.fields,
                })
            }
            UPDATE_CANVAS => {
                let args: UpdateArgs = serde_json::from_value(arguments.clone())
                    .map_err(|e| invalid(e.to_string()))?;
                if args.fields.is_empty() {
                    return Err(invalid("fields must not be empty".to_string()));
                }
                let record_id = args
                    .record_id
                    .parse()
                    .map_err(|_| invalid(format!("malformed record_id: {}", args.record_id)))?;
                Ok(Self::UpdateCanvas {
                    record_id,
                    fields: args.fields,
                })
            }
            WEB_SEARCH => {
                let args: SearchArgs = serde_json::from_value(arguments.clone())
                    .map_err(|e| invalid(e.to_string()))?;
                let query = args.query.trim().to_string();
                if query.is_empty() {
                    return Err(invalid("query must not be empty".to_string()));
                }
                Ok(Self::WebSearch { query })
            }
            other => Err(ToolParseError::UnknownTool {
                name: other.to_string(),
            }),
        }
    }
}

/// The result of executing a tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    /// A new record was created.
    Saved { record_id: CanvasRecordId },
    /// An existing record's fields were replaced.
    Updated { record_id: CanvasRecordId },
    /// Search completed, possibly with zero results.
    Results { results: Vec<SearchResult> },
    /// The invocation failed; the message is fed back to the model.
    Failed { message: String },
}

impl ToolOutcome {
    /// Serializes the outcome into the JSON payload persisted in tool turns.
    #[must_use]
    pub fn to_payload(&self) -> JsonValue {
        match self {
            Self::Saved { record_id } | Self::Updated { record_id } => {
                serde_json::json!({"status": "ok", "record_id": record_id.to_string()})
            }
            Self::Results { results } => {
                serde_json::json!({"status": "ok", "results": results})
            }
            Self::Failed { message } => {
                serde_json::json!({"status": "error", "message": message})
            }
        }
    }

    /// Returns true if the invocation failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// The tool specifications offered to the model during decision calls.
#[must_use]
pub fn tool_specs() -> Vec<ToolSpec> {
    let field_schema = serde_json::json!({
        "type": "object",
        "properties": {
            "tag": {
                "type": "string",
                "description": "The aspect this field covers, e.g. \"Customer Segments\""
            },
            "content": {"type": "string", "description": "The field content"}
        },
        "required": ["tag", "content"]
    });

    vec![
        ToolSpec::new(
            SAVE_CANVAS,
            "Save the canvas assembled from the conversation as a new record. \
             Call this once enough aspects have been gathered; include every \
             field learned so far.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "fields": {"type": "array", "items": field_schema, "minItems": 1}
                },
                "required": ["fields"]
            }),
        ),
        ToolSpec::new(
            UPDATE_CANVAS,
            "Replace the field list of an existing canvas record. The new list \
             replaces the old one completely, so include every field that \
             should remain, not only the changed ones.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "record_id": {
                        "type": "string",
                        "description": "The id of the record to update"
                    },
                    "fields": {"type": "array", "items": field_schema, "minItems": 1}
                },
                "required": ["record_id", "fields"]
            }),
        ),
        ToolSpec::new(
            WEB_SEARCH,
            "Search the web for current information, e.g. market data or \
             competitors, to ground the conversation.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "The search query"}
                },
                "required": ["query"]
            }),
        ),
    ]
}

/// Executes tool invocations against the canvas store and search client.
///
/// Dispatch is infallible by construction: every failure mode collapses into
/// [`ToolOutcome::Failed`], which the model sees as data.
pub struct ToolDispatcher<'a> {
    canvas: &'a dyn CanvasStore,
    search: &'a dyn SearchClient,
}

impl<'a> ToolDispatcher<'a> {
    /// Creates a dispatcher over the given backends.
    #[must_use]
    pub fn new(canvas: &'a dyn CanvasStore, search: &'a dyn SearchClient) -> Self {
        Self { canvas, search }
    }

    /// Parses and executes one invocation on behalf of `owner`.
    pub async fn dispatch(&self, owner: UserId, name: &str, arguments: &JsonValue) -> ToolOutcome {
        match ToolRequest::parse(name, arguments) {
            Ok(request) => self.execute(owner, request).await,
            Err(e) => ToolOutcome::Failed {
                message: e.to_string(),
            },
        }
    }

    async fn execute(&self, owner: UserId, request: ToolRequest) -> ToolOutcome {
        match request {
            ToolRequest::CreateCanvas { fields } => {
                let record = CanvasRecord::new(owner, fields);
                match self.canvas.create(&record).await {
                    Ok(()) => ToolOutcome::Saved {
                        record_id: record.id,
                    },
                    Err(e) => ToolOutcome::Failed {
                        message: e.to_string(),
                    },
                }
            }
            ToolRequest::UpdateCanvas { record_id, fields } => {
                match self.canvas.replace_fields(record_id, owner, fields).await {
                    Ok(record) => ToolOutcome::Updated {
                        record_id: record.id,
                    },
                    Err(CanvasError::NotFound { id }) => ToolOutcome::Failed {
                        message: format!("no canvas record found with id {id}"),
                    },
                    Err(e) => ToolOutcome::Failed {
                        message: e.to_string(),
                    },
                }
            }
            ToolRequest::WebSearch { query } => match self.search.search(&query).await {
                Ok(results) => ToolOutcome::Results { results },
                Err(e) => ToolOutcome::Failed {
                    message: format!("search unavailable: {e}"),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingSearch, MemoryCanvasStore, StubSearch};

    #[test]
    fn parse_rejects_unknown_tool() {
        let err = ToolRequest::parse("drop_tables", &serde_json::json!({})).unwrap_err();
        assert!(matches!(err, ToolParseError::UnknownTool { .. }));
    }

    #[test]
    fn parse_rejects_empty_fields() {
        let err =
            ToolRequest::parse(SAVE_CANVAS, &serde_json::json!({"fields": []})).unwrap_err();
        assert!(matches!(err, ToolParseError::InvalidArguments { .. }));
    }

    #[test]
    fn parse_rejects_malformed_record_id() {
        let args = serde_json::json!({
            "record_id": "not-an-id",
            "fields": [{"tag": "Channels", "content": "Online"}]
        });
        let err = ToolRequest::parse(UPDATE_CANVAS, &args).unwrap_err();
        assert!(err.to_string().contains("record_id"));
    }

    #[test]
    fn parse_rejects_blank_query() {
        let err =
            ToolRequest::parse(WEB_SEARCH, &serde_json::json!({"query": "   "})).unwrap_err();
        assert!(matches!(err, ToolParseError::InvalidArguments { .. }));
    }

    #[test]
    fn parse_accepts_save_arguments() {
        let args = serde_json::json!({
            "fields": [{"tag": "Customer Segments", "content": "Remote workers"}]
        });
        let request = ToolRequest::parse(SAVE_CANVAS, &args).expect("parse");
        assert!(matches!(request, ToolRequest::CreateCanvas { ref fields } if fields.len() == 1));
    }

    #[test]
    fn specs_cover_the_whole_vocabulary() {
        let names: Vec<String> = tool_specs().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec![SAVE_CANVAS, UPDATE_CANVAS, WEB_SEARCH]);
    }

    #[tokio::test]
    async fn create_then_update_replaces_fields() {
        let canvas = MemoryCanvasStore::default();
        let search = StubSearch::default();
        let dispatcher = ToolDispatcher::new(&canvas, &search);
        let owner = UserId::new();

        let outcome = dispatcher
            .dispatch(
                owner,
                SAVE_CANVAS,
                &serde_json::json!({
                    "fields": [{"tag": "Customer Segments", "content": "Students"}]
                }),
            )
            .await;
        let ToolOutcome::Saved { record_id } = outcome else {
            panic!("expected saved outcome, got {outcome:?}");
        };

        let outcome = dispatcher
            .dispatch(
                owner,
                UPDATE_CANVAS,
                &serde_json::json!({
                    "record_id": record_id.to_string(),
                    "fields": [
                        {"tag": "Customer Segments", "content": "Students"},
                        {"tag": "Channels", "content": "Campus pop-ups"}
                    ]
                }),
            )
            .await;
        assert!(matches!(outcome, ToolOutcome::Updated { .. }));

        let record = canvas.get(record_id).await.expect("record exists");
        assert_eq!(record.fields.len(), 2);
    }

    #[tokio::test]
    async fn update_replace_removes_omitted_tags() {
        let canvas = MemoryCanvasStore::default();
        let search = StubSearch::default();
        let dispatcher = ToolDispatcher::new(&canvas, &search);
        let owner = UserId::new();

        let ToolOutcome::Saved { record_id } = dispatcher
            .dispatch(
                owner,
                SAVE_CANVAS,
                &serde_json::json!({
                    "fields": [
                        {"tag": "Customer Segments", "content": "Students"},
                        {"tag": "Channels", "content": "Campus pop-ups"}
                    ]
                }),
            )
            .await
        else {
            panic!("expected saved outcome");
        };

        dispatcher
            .dispatch(
                owner,
                UPDATE_CANVAS,
                &serde_json::json!({
                    "record_id": record_id.to_string(),
                    "fields": [{"tag": "Channels", "content": "Delivery"}]
                }),
            )
            .await;

        let record = canvas.get(record_id).await.expect("record exists");
        assert_eq!(record.fields.len(), 1);
        assert!(record.field("Customer Segments").is_none());
    }

    #[tokio::test]
    async fn update_of_foreign_record_fails() {
        let canvas = MemoryCanvasStore::default();
        let search = StubSearch::default();
        let dispatcher = ToolDispatcher::new(&canvas, &search);

        let ToolOutcome::Saved { record_id } = dispatcher
            .dispatch(
                UserId::new(),
                SAVE_CANVAS,
                &serde_json::json!({"fields": [{"tag": "Channels", "content": "Web"}]}),
            )
            .await
        else {
            panic!("expected saved outcome");
        };

        let outcome = dispatcher
            .dispatch(
                UserId::new(),
                UPDATE_CANVAS,
                &serde_json::json!({
                    "record_id": record_id.to_string(),
                    "fields": [{"tag": "Channels", "content": "Stolen"}]
                }),
            )
            .await;
        assert!(outcome.is_error());
    }

    #[tokio::test]
    async fn published_record_enters_the_public_listing() {
        let canvas = MemoryCanvasStore::default();
        let search = StubSearch::default();
        let dispatcher = ToolDispatcher::new(&canvas, &search);
        let owner = UserId::new();

        let ToolOutcome::Saved { record_id } = dispatcher
            .dispatch(
                owner,
                SAVE_CANVAS,
                &serde_json::json!({"fields": [{"tag": "Channels", "content": "Web"}]}),
            )
            .await
        else {
            panic!("expected saved outcome");
        };

        // Records start private.
        assert!(canvas.list_public().await.unwrap().is_empty());

        canvas.set_public(record_id, owner, true).await.expect("publish");
        let public = canvas.list_public().await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].id, record_id);

        // Only the owner can change visibility.
        let foreign = canvas.set_public(record_id, UserId::new(), false).await;
        assert!(matches!(foreign, Err(CanvasError::NotFound { .. })));
    }

    #[tokio::test]
    async fn search_failure_degrades_to_error_outcome() {
        let canvas = MemoryCanvasStore::default();
        let search = FailingSearch;
        let dispatcher = ToolDispatcher::new(&canvas, &search);

        let outcome = dispatcher
            .dispatch(
                UserId::new(),
                WEB_SEARCH,
                &serde_json::json!({"query": "coffee market size"}),
            )
            .await;

        let payload = outcome.to_payload();
        assert_eq!(payload["status"], "error");
        assert!(payload["message"].as_str().unwrap().contains("search"));
    }

    #[tokio::test]
    async fn empty_search_results_are_ok() {
        let canvas = MemoryCanvasStore::default();
        let search = StubSearch::default();
        let dispatcher = ToolDispatcher::new(&canvas, &search);

        let outcome = dispatcher
            .dispatch(UserId::new(), WEB_SEARCH, &serde_json::json!({"query": "q"}))
            .await;

        let payload = outcome.to_payload();
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["results"], serde_json::json!([]));
    }
}
