//! Model gateway abstraction.
//!
//! The gateway exposes exactly two operations: a blocking decision call that
//! may return text or tool invocation requests, and a streaming call that
//! yields the final reply as incremental fragments. Failures are surfaced as
//! [`GatewayError`] and are not retried at this layer.

use crate::chat::{ChatMessage, ChatRole, Decision, ToolCallRequest, ToolSpec};
use crate::error::GatewayError;
use crate::sse::{SseDecoder, SseEvent};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::time::Duration;

/// A finite, non-restartable stream of reply fragments.
///
/// Dropping the stream drops the underlying HTTP response, releasing the
/// upstream connection; an abandoned stream must not leak the request.
pub type ReplyStream = BoxStream<'static, Result<String, GatewayError>>;

/// Trait for model gateways.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Sends the full ordered context plus available tool specifications and
    /// returns the model's decision.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] on transport or HTTP failure. Callers treat
    /// this as non-retriable within the turn.
    async fn decide(
        &self,
        context: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<Decision, GatewayError>;

    /// Sends the context without tools and streams the final reply.
    ///
    /// Fragments are yielded in arrival order, with no buffering beyond what
    /// is needed to detect stream end.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the request cannot be established.
    async fn stream_final(&self, context: &[ChatMessage]) -> Result<ReplyStream, GatewayError>;
}

/// Configuration for an OpenAI-compatible gateway.
#[derive(Debug, Clone)]
pub struct OpenAiGatewayConfig {
    /// Base URL of the API, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Bearer token for the API.
    pub api_key: String,
    /// Deadline for each gateway call, in seconds.
    pub timeout_seconds: u64,
}

/// Gateway speaking the OpenAI-compatible chat completions protocol.
pub struct OpenAiGateway {
    config: OpenAiGatewayConfig,
    client: reqwest::Client,
}

impl OpenAiGateway {
    /// Creates a gateway from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] when the base URL, model, or
    /// API key is blank.
    pub fn new(config: OpenAiGatewayConfig) -> Result<Self, GatewayError> {
        for (value, name) in [
            (&config.base_url, "base_url"),
            (&config.model, "model"),
            (&config.api_key, "api_key"),
        ] {
            if value.trim().is_empty() {
                return Err(GatewayError::InvalidConfig {
                    reason: format!("{name} must not be empty"),
                });
            }
        }

        Ok(Self {
            config,
            client: reqwest::Client::new(),
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_seconds)
    }

    async fn post_completions(
        &self,
        body: &JsonValue,
    ) -> Result<reqwest::Response, GatewayError> {
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .timeout(self.request_timeout())
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Upstream {
                status: Some(status.as_u16()),
                message,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatGateway for OpenAiGateway {
    async fn decide(
        &self,
        context: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<Decision, GatewayError> {
        let body = build_request_body(&self.config.model, context, tools, false);
        let response = self.post_completions(&body).await?;

        let parsed: CompletionResponse =
            response
                .json()
                .await
                .map_err(|e| GatewayError::ResponseParseFailed {
                    reason: e.to_string(),
                })?;

        decision_from_response(parsed)
    }

    async fn stream_final(&self, context: &[ChatMessage]) -> Result<ReplyStream, GatewayError> {
        let body = build_request_body(&self.config.model, context, &[], true);
        let response = self.post_completions(&body).await?;

        let state = StreamState {
            inner: response
                .bytes_stream()
                .map(|chunk| chunk.map(|b| b.to_vec()))
                .boxed(),
            decoder: SseDecoder::new(),
            queued: VecDeque::new(),
            done: false,
        };

        let stream = futures::stream::unfold(state, |mut state| async move {
            loop {
                if let Some(fragment) = state.queued.pop_front() {
                    return Some((Ok(fragment), state));
                }
                if state.done {
                    return None;
                }

                match state.inner.next().await {
                    None => {
                        state.done = true;
                    }
                    Some(Err(e)) => {
                        state.done = true;
                        return Some((Err(transport_error(e)), state));
                    }
                    Some(Ok(bytes)) => {
                        for event in state.decoder.feed(&String::from_utf8_lossy(&bytes)) {
                            match event {
                                SseEvent::Delta(text) => state.queued.push_back(text),
                                SseEvent::Done => state.done = true,
                            }
                        }
                    }
                }
            }
        });

        Ok(stream.boxed())
    }
}

struct StreamState {
    inner: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    decoder: SseDecoder,
    queued: VecDeque<String>,
    done: bool,
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    let message = if e.is_timeout() {
        "request timed out".to_string()
    } else {
        e.to_string()
    };
    GatewayError::Upstream {
        status: e.status().map(|s| s.as_u16()),
        message,
    }
}

/// Builds the chat completions request body.
fn build_request_body(
    model: &str,
    context: &[ChatMessage],
    tools: &[ToolSpec],
    stream: bool,
) -> JsonValue {
    let messages: Vec<JsonValue> = context.iter().map(message_to_wire).collect();

    let mut body = serde_json::json!({
        "model": model,
        "messages": messages,
        "stream": stream,
    });

    if !tools.is_empty() {
        let wire_tools: Vec<JsonValue> = tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    }
                })
            })
            .collect();
        body["tools"] = serde_json::json!(wire_tools);
        body["tool_choice"] = serde_json::json!("auto");
    }

    body
}

fn message_to_wire(message: &ChatMessage) -> JsonValue {
    let role = match message.role {
        ChatRole::System => "system",
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
        ChatRole::Tool => "tool",
    };

    let mut wire = serde_json::json!({
        "role": role,
        // Some OpenAI-compatible APIs require the content field even when the
        // assistant only emits tool calls.
        "content": message.content,
    });

    if message.has_tool_calls() {
        let calls: Vec<JsonValue> = message
            .tool_calls
            .iter()
            .map(|call| {
                serde_json::json!({
                    "id": call.id,
                    "type": "function",
                    "function": {
                        "name": call.name,
                        "arguments": call.arguments.to_string(),
                    }
                })
            })
            .collect();
        wire["tool_calls"] = serde_json::json!(calls);
    }

    if let Some(ref id) = message.tool_call_id {
        wire["tool_call_id"] = serde_json::json!(id);
    }

    wire
}

fn decision_from_response(response: CompletionResponse) -> Result<Decision, GatewayError> {
    let message = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .ok_or_else(|| GatewayError::ResponseParseFailed {
            reason: "response carried no choices".to_string(),
        })?;

    let calls: Vec<ToolCallRequest> = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| {
            let arguments =
                serde_json::from_str(&tc.function.arguments).unwrap_or(JsonValue::Null);
            ToolCallRequest::new(tc.id, tc.function.name, arguments)
        })
        .collect();

    if calls.is_empty() {
        Ok(Decision::Text(message.content.unwrap_or_default()))
    } else {
        Ok(Decision::ToolCalls {
            content: message.content.filter(|c| !c.is_empty()),
            calls,
        })
    }
}

/// Chat completions response wire format.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: &str) -> OpenAiGatewayConfig {
        OpenAiGatewayConfig {
            base_url: "https://api.example.test/v1".to_string(),
            model: "test-model".to_string(),
            api_key: api_key.to_string(),
            timeout_seconds: 5,
        }
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let result = OpenAiGateway::new(config("  "));
        let Err(GatewayError::InvalidConfig { reason }) = result else {
            panic!("expected invalid config error");
        };
        assert!(reason.contains("api_key"));
    }

    #[test]
    fn complete_config_is_accepted() {
        assert!(OpenAiGateway::new(config("sk-test")).is_ok());
    }

    #[test]
    fn request_body_without_tools_omits_tool_choice() {
        let context = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let body = build_request_body("test-model", &context, &[], false);

        assert_eq!(body["model"], "test-model");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn request_body_with_tools_sets_auto_choice() {
        let tools = vec![ToolSpec::new(
            "web_search",
            "Search the web",
            serde_json::json!({"type": "object"}),
        )];
        let body = build_request_body("m", &[ChatMessage::user("q")], &tools, false);

        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"][0]["function"]["name"], "web_search");
    }

    #[test]
    fn assistant_tool_calls_serialize_arguments_as_string() {
        let call = ToolCallRequest::new("call_1", "web_search", serde_json::json!({"query": "x"}));
        let msg = ChatMessage::assistant_tool_calls(None, vec![call]);
        let wire = message_to_wire(&msg);

        assert_eq!(wire["role"], "assistant");
        assert!(wire["content"].is_null());
        assert_eq!(wire["tool_calls"][0]["id"], "call_1");
        assert_eq!(
            wire["tool_calls"][0]["function"]["arguments"],
            "{\"query\":\"x\"}"
        );
    }

    #[test]
    fn tool_message_wire_format() {
        let msg = ChatMessage::tool("call_7", r#"{"status":"ok"}"#);
        let wire = message_to_wire(&msg);

        assert_eq!(wire["role"], "tool");
        assert_eq!(wire["tool_call_id"], "call_7");
        assert_eq!(wire["content"], r#"{"status":"ok"}"#);
    }

    #[test]
    fn text_decision_parsed() {
        let raw = r#"{"choices":[{"message":{"content":"Hello there"}}]}"#;
        let response: CompletionResponse = serde_json::from_str(raw).expect("parse");
        let decision = decision_from_response(response).expect("decision");

        assert_eq!(decision, Decision::Text("Hello there".to_string()));
    }

    #[test]
    fn tool_call_decision_parsed() {
        let raw = r#"{
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "save_canvas", "arguments": "{\"fields\":[]}"}
                    }]
                }
            }]
        }"#;
        let response: CompletionResponse = serde_json::from_str(raw).expect("parse");
        let decision = decision_from_response(response).expect("decision");

        match decision {
            Decision::ToolCalls { content, calls } => {
                assert!(content.is_none());
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].name, "save_canvas");
                assert_eq!(calls[0].arguments, serde_json::json!({"fields": []}));
            }
            Decision::Text(_) => panic!("expected tool calls"),
        }
    }

    #[test]
    fn malformed_tool_arguments_become_null() {
        let raw = r#"{
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "id": "call_2",
                        "function": {"name": "save_canvas", "arguments": "not json"}
                    }]
                }
            }]
        }"#;
        let response: CompletionResponse = serde_json::from_str(raw).expect("parse");
        let decision = decision_from_response(response).expect("decision");

        match decision {
            Decision::ToolCalls { calls, .. } => {
                assert_eq!(calls[0].arguments, JsonValue::Null);
            }
            Decision::Text(_) => panic!("expected tool calls"),
        }
    }

    #[test]
    fn empty_choices_is_a_parse_error() {
        let response: CompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).expect("parse");
        let result = decision_from_response(response);
        assert!(matches!(
            result,
            Err(GatewayError::ResponseParseFailed { .. })
        ));
    }
}
