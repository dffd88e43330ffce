//! Two-phase tool-use protocol.
//!
//! Phase 1 sends the transcript together with one tool declaration. If the
//! model answers directly, that answer is returned. If it asks for the tool,
//! the assistant message is appended verbatim, followed by a tool message
//! carrying the call's raw arguments, and Phase 2 sends the extended
//! transcript without tools.
//!
//! The decision between the two outcomes is the pure function [`advance`];
//! [`complete_with_tool`] only adds the network calls around it.

use secrecy::SecretString;
use tracing::{debug, instrument};

use super::client::ChatCompletion;
use super::error::AiError;
use super::types::{ChatCompletionResponse, Message, ToolDeclaration};

/// Outcome of inspecting a Phase-1 response.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolStep {
    /// The model answered without using the tool.
    Answer(String),
    /// The model used the tool; send this transcript as Phase 2.
    FollowUp(Vec<Message>),
}

/// Decide what to do with a Phase-1 response.
///
/// Only the first tool call is answered. Its `function.arguments` are passed
/// back unchanged as the tool output, since the tool is executed upstream.
///
/// # Errors
///
/// - `AiError::Decode` if the response has no choice, or a final answer has
///   no content.
/// - `AiError::ProtocolShape` if the finish reason is `tool_calls` but the
///   message carries no tool call.
pub fn advance(
    mut transcript: Vec<Message>,
    response: ChatCompletionResponse,
    tool_name: &str,
) -> Result<ToolStep, AiError> {
    let choice = response.into_first_choice()?;

    if !choice.wants_tool() {
        return choice.into_answer().map(ToolStep::Answer);
    }

    let (call_id, arguments) = match choice.message.tool_calls.as_deref() {
        Some([first, rest @ ..]) => {
            if !rest.is_empty() {
                debug!(ignored = rest.len(), "ignoring additional tool calls");
            }
            (first.id.clone(), first.function.arguments.clone())
        }
        _ => {
            return Err(AiError::ProtocolShape(
                "finish_reason is tool_calls but no tool call was returned".to_string(),
            ));
        }
    };

    transcript.push(choice.message);
    transcript.push(Message::tool_result(call_id, tool_name, arguments));
    Ok(ToolStep::FollowUp(transcript))
}

/// Run the tool-use protocol for a single declared tool.
///
/// Client failures in either phase are returned unchanged.
///
/// # Errors
///
/// Returns any `AiError` from the client or from [`advance`].
#[instrument(skip(client, messages, credential), fields(messages = messages.len()))]
pub async fn complete_with_tool<C: ChatCompletion>(
    client: &C,
    messages: Vec<Message>,
    credential: &SecretString,
    tool_name: &str,
) -> Result<String, AiError> {
    let tools = [ToolDeclaration::builtin(tool_name)];
    let response = client.complete(&messages, credential, Some(&tools)).await?;

    match advance(messages, response, tool_name)? {
        ToolStep::Answer(text) => Ok(text),
        ToolStep::FollowUp(transcript) => {
            debug!(messages = transcript.len(), "tool requested, sending follow-up");
            client
                .complete(&transcript, credential, None)
                .await?
                .into_answer()
        }
    }
}
