//! Scripted chat-completion backend for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Map;

use leafspring_crm_core::MessageRole;

use super::client::ChatCompletion;
use super::error::AiError;
use super::types::{
    ChatCompletionResponse, Choice, FinishReason, FunctionCall, Message, ToolCall, ToolDeclaration,
};

/// One recorded `complete` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub tools: Option<Vec<ToolDeclaration>>,
    pub credential: String,
}

/// Replays queued results in order and records every call.
///
/// Running out of results is reported as an upstream error so a test that
/// makes an unexpected call fails loudly.
#[derive(Default)]
pub struct ScriptedClient {
    results: Mutex<VecDeque<Result<ChatCompletionResponse, AiError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedClient {
    pub fn new(results: Vec<Result<ChatCompletionResponse, AiError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl ChatCompletion for ScriptedClient {
    async fn complete(
        &self,
        messages: &[Message],
        credential: &SecretString,
        tools: Option<&[ToolDeclaration]>,
    ) -> Result<ChatCompletionResponse, AiError> {
        self.calls.lock().expect("calls lock").push(RecordedCall {
            messages: messages.to_vec(),
            tools: tools.map(<[_]>::to_vec),
            credential: credential.expose_secret().to_string(),
        });

        self.results
            .lock()
            .expect("results lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(AiError::Upstream {
                    status: None,
                    message: "unexpected call".to_string(),
                })
            })
    }
}

fn response(message: Message, finish_reason: FinishReason) -> ChatCompletionResponse {
    ChatCompletionResponse {
        choices: vec![Choice {
            message,
            finish_reason: Some(finish_reason),
        }],
        error: None,
    }
}

/// A final answer.
pub fn stop(content: &str) -> ChatCompletionResponse {
    response(Message::assistant(content), FinishReason::Stop)
}

/// A tool request carrying `calls`.
pub fn tool_calls(calls: Vec<ToolCall>) -> ChatCompletionResponse {
    let mut extra = Map::new();
    extra.insert("partial".to_string(), serde_json::Value::Bool(false));
    let message = Message {
        role: MessageRole::Assistant,
        content: Some(String::new()),
        tool_call_id: None,
        name: None,
        tool_calls: Some(calls),
        extra,
    };
    response(message, FinishReason::ToolCalls)
}

/// One tool call.
pub fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        call_type: "builtin_function".to_string(),
        function: FunctionCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        },
        extra: Map::new(),
    }
}
