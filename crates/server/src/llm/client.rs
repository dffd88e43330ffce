//! Chat-completion API client.
//!
//! One request/response exchange per call. The API key is supplied by the
//! caller on every call and never stored on the client.

use std::future::Future;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

use crate::config::LlmConfig;

use super::error::AiError;
use super::types::{ApiErrorResponse, ChatCompletionResponse, ChatRequest, Message, ToolDeclaration};

/// Longest upstream error body echoed back in an [`AiError::Upstream`] message.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// A chat-completion backend.
///
/// Implemented by [`ChatClient`] for the real upstream; tests substitute
/// scripted implementations.
pub trait ChatCompletion: Send + Sync {
    /// Send `messages` (plus optional tool declarations) and return the
    /// parsed response.
    ///
    /// # Errors
    ///
    /// Returns `AiError` on invalid input, transport failure, an upstream
    /// error, or an undecodable body.
    fn complete(
        &self,
        messages: &[Message],
        credential: &SecretString,
        tools: Option<&[ToolDeclaration]>,
    ) -> impl Future<Output = Result<ChatCompletionResponse, AiError>> + Send;
}

/// Chat-completion API client.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<ChatClientInner>,
}

struct ChatClientInner {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl ChatClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `config` - endpoint, model and sampling bounds
    ///
    /// # Errors
    ///
    /// Returns `AiError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, AiError> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            inner: Arc::new(ChatClientInner {
                client,
                endpoint: config.api_url.to_string(),
                model: config.model.clone(),
                max_tokens: config.max_tokens,
                temperature: config.temperature,
            }),
        })
    }

    /// The model identifier sent with every request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }
}

impl ChatCompletion for ChatClient {
    #[instrument(
        skip(self, messages, credential, tools),
        fields(model = %self.inner.model, messages = messages.len(), tools = tools.map_or(0, <[_]>::len))
    )]
    async fn complete(
        &self,
        messages: &[Message],
        credential: &SecretString,
        tools: Option<&[ToolDeclaration]>,
    ) -> Result<ChatCompletionResponse, AiError> {
        validate_request(messages, credential, tools)?;

        let request = ChatRequest {
            model: &self.inner.model,
            messages,
            max_tokens: self.inner.max_tokens,
            temperature: self.inner.temperature,
            tools,
        };

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .bearer_auth(credential.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "chat completion received");

        decode_response(status, &body)
    }
}

/// Check the preconditions of a completion request.
fn validate_request(
    messages: &[Message],
    credential: &SecretString,
    tools: Option<&[ToolDeclaration]>,
) -> Result<(), AiError> {
    if credential.expose_secret().trim().is_empty() {
        return Err(AiError::MissingCredential);
    }
    if messages.is_empty() {
        return Err(AiError::InvalidRequest(
            "at least one message is required".to_string(),
        ));
    }
    if tools.is_some_and(<[_]>::is_empty) {
        return Err(AiError::InvalidRequest(
            "tool list must not be empty when present".to_string(),
        ));
    }
    Ok(())
}

/// Turn a raw upstream response into a parsed completion or a typed error.
fn decode_response(
    status: reqwest::StatusCode,
    body: &str,
) -> Result<ChatCompletionResponse, AiError> {
    if !status.is_success() {
        let message = serde_json::from_str::<ApiErrorResponse>(body).map_or_else(
            |_| fallback_error_message(status, body),
            |envelope| envelope.error.message,
        );
        return Err(AiError::Upstream {
            status: Some(status.as_u16()),
            message,
        });
    }

    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| AiError::Decode(format!("failed to parse response: {e}")))?;

    if let Some(error) = response.error {
        return Err(AiError::Upstream {
            status: Some(status.as_u16()),
            message: error.message,
        });
    }

    if response.choices.is_empty() {
        return Err(AiError::Decode("response contained no choices".to_string()));
    }

    Ok(response)
}

/// Message for an error body that is not a JSON error envelope.
fn fallback_error_message(status: reqwest::StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return status.to_string();
    }
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
