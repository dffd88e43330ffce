//! Types for the chat-completion API.
//!
//! These types match the OpenAI-compatible chat-completion wire format used by
//! the upstream provider, including its built-in function tools.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use leafspring_crm_core::MessageRole;

use super::error::AiError;

/// A message in a chat-completion transcript.
///
/// Order matters: the transcript is sent to the model verbatim. Fields the
/// upstream sends that are not modeled here are kept in `extra` so an
/// assistant message can be echoed back byte-for-byte in meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who produced the message.
    pub role: MessageRole,
    /// Text content. Assistant messages that only carry tool calls may have none.
    #[serde(default)]
    pub content: Option<String>,
    /// ID of the tool call this message answers (tool messages only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool name (tool messages only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tool invocations requested by the model (assistant messages only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Unmodeled fields, retained for verbatim round trips.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    fn text(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_call_id: None,
            name: None,
            tool_calls: None,
            extra: Map::new(),
        }
    }

    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(MessageRole::System, content)
    }

    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(MessageRole::User, content)
    }

    /// Create an assistant message with plain text content.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(MessageRole::Assistant, content)
    }

    /// Create a tool-result message answering the tool call `tool_call_id`.
    #[must_use]
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
            ..Self::text(MessageRole::Tool, content)
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation ID; echoed back in the tool-result message.
    pub id: String,
    /// Call type (always `"function"` in practice).
    #[serde(rename = "type", default = "default_call_type")]
    pub call_type: String,
    /// Which tool and with what arguments.
    pub function: FunctionCall,
    /// Unmodeled fields, retained for verbatim round trips.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_call_type() -> String {
    "function".to_string()
}

/// Function name and opaque argument payload of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the declared tool.
    pub name: String,
    /// Raw argument payload (a JSON document encoded as a string).
    #[serde(default)]
    pub arguments: String,
}

/// A capability the model may invoke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    /// Tool kind.
    #[serde(rename = "type")]
    pub kind: ToolKind,
    /// Tool identity.
    pub function: ToolFunction,
}

impl ToolDeclaration {
    /// Declare a tool that the upstream executes on its own side.
    #[must_use]
    pub fn builtin(name: impl Into<String>) -> Self {
        Self {
            kind: ToolKind::BuiltinFunction,
            function: ToolFunction { name: name.into() },
        }
    }
}

/// Kind of tool declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Executed by the upstream service, not by this server.
    BuiltinFunction,
}

/// Name of a declared tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFunction {
    /// Tool name.
    pub name: String,
}

/// Request body for the chat-completion endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    /// Model identifier.
    pub model: &'a str,
    /// Conversation transcript.
    pub messages: &'a [Message],
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Declared tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<&'a [ToolDeclaration]>,
}

/// Response body of the chat-completion endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    /// Candidate completions; the first one is used.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Error envelope, present when the upstream reports a failure in-band.
    #[serde(default)]
    pub error: Option<ApiError>,
}

impl ChatCompletionResponse {
    /// Take the first choice.
    ///
    /// # Errors
    ///
    /// Returns `AiError::Decode` if the response has no choices.
    pub fn into_first_choice(self) -> Result<Choice, AiError> {
        self.choices
            .into_iter()
            .next()
            .ok_or_else(|| AiError::Decode("response contained no choices".to_string()))
    }

    /// Take the text answer of the first choice.
    ///
    /// # Errors
    ///
    /// Returns `AiError::Decode` if there is no choice or it carries no content.
    pub fn into_answer(self) -> Result<String, AiError> {
        self.into_first_choice()?.into_answer()
    }
}

/// One candidate completion.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    /// The generated message.
    pub message: Message,
    /// Why generation stopped.
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

impl Choice {
    /// Whether the model asked to invoke a tool before answering.
    #[must_use]
    pub fn wants_tool(&self) -> bool {
        self.finish_reason == Some(FinishReason::ToolCalls)
    }

    /// Take the text content of the message.
    ///
    /// # Errors
    ///
    /// Returns `AiError::Decode` if the message carries no content.
    pub fn into_answer(self) -> Result<String, AiError> {
        self.message
            .content
            .ok_or_else(|| AiError::Decode("response message has no content".to_string()))
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of response.
    Stop,
    /// Max tokens reached.
    Length,
    /// Tool invocation requested.
    ToolCalls,
    /// Output withheld by the provider's content filter.
    ContentFilter,
    /// Any reason this server does not know about.
    #[serde(other)]
    Other,
}

/// In-band error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub message: String,
    /// Provider error type.
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}

/// Body of a non-2xx response.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    /// Error details.
    pub error: ApiError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_declaration_serialization() {
        let tool = ToolDeclaration::builtin("web_search");
        let json = serde_json::to_value(&tool).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"type": "builtin_function", "function": {"name": "web_search"}})
        );
    }

    #[test]
    fn test_tool_result_message_serialization() {
        let msg = Message::tool_result("c1", "web_search", "{}");
        let json = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "role": "tool",
                "content": "{}",
                "tool_call_id": "c1",
                "name": "web_search"
            })
        );
    }

    #[test]
    fn test_user_message_omits_tool_fields() {
        let json = serde_json::to_string(&Message::user("Hello")).expect("serialize");
        assert_eq!(json, r#"{"role":"user","content":"Hello"}"#);
    }

    #[test]
    fn test_assistant_message_keeps_unknown_fields() {
        let raw = serde_json::json!({
            "role": "assistant",
            "content": "",
            "tool_calls": [{
                "index": 0,
                "id": "call_1",
                "type": "builtin_function",
                "function": {"name": "web_search", "arguments": "{\"q\":1}"}
            }],
            "partial": false
        });

        let msg: Message = serde_json::from_value(raw.clone()).expect("deserialize");
        assert_eq!(msg.extra.get("partial"), Some(&serde_json::json!(false)));
        let calls = msg.tool_calls.as_ref().expect("tool calls");
        assert_eq!(calls[0].call_type, "builtin_function");

        let back = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(back, raw);
    }

    #[test]
    fn test_finish_reason_deserialization() {
        let reason: FinishReason = serde_json::from_str("\"tool_calls\"").expect("deserialize");
        assert_eq!(reason, FinishReason::ToolCalls);

        let reason: FinishReason = serde_json::from_str("\"stop\"").expect("deserialize");
        assert_eq!(reason, FinishReason::Stop);

        let reason: FinishReason = serde_json::from_str("\"eos\"").expect("deserialize");
        assert_eq!(reason, FinishReason::Other);
    }

    #[test]
    fn test_response_without_choices_is_decode_error() {
        let response: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices": []}"#).expect("deserialize");
        assert!(matches!(response.into_answer(), Err(AiError::Decode(_))));
    }

    #[test]
    fn test_response_answer() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Hi"},"finish_reason":"stop"}]}"#,
        )
        .expect("deserialize");
        assert_eq!(response.into_answer().expect("answer"), "Hi");
    }
}
