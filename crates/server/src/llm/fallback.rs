//! Web-search answering with a plain-completion fallback.

use secrecy::SecretString;
use tracing::{instrument, warn};

use super::client::ChatCompletion;
use super::error::AiError;
use super::orchestrator::complete_with_tool;
use super::types::{ChatCompletionResponse, Message};

/// Name of the upstream's built-in web search tool.
pub const WEB_SEARCH_TOOL: &str = "web_search";

/// Answer `messages`, letting the model search the web first.
///
/// Any failure of the tool path is logged and followed by exactly one plain
/// completion with no tools. There is no delay between the attempts.
///
/// # Errors
///
/// Returns `AiError::AnalysisFailed` carrying the plain completion's error
/// when both attempts fail. The tool path's error is only logged.
#[instrument(skip(client, messages, credential), fields(messages = messages.len()))]
pub async fn answer_with_search<C: ChatCompletion>(
    client: &C,
    messages: Vec<Message>,
    credential: &SecretString,
) -> Result<String, AiError> {
    let err = match complete_with_tool(client, messages.clone(), credential, WEB_SEARCH_TOOL).await
    {
        Ok(answer) => return Ok(answer),
        Err(err) => err,
    };

    warn!(error_kind = err.kind(), "web search failed, answering without tools");

    client
        .complete(&messages, credential, None)
        .await
        .and_then(ChatCompletionResponse::into_answer)
        .map_err(|e| AiError::AnalysisFailed(Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{ScriptedClient, stop, tool_call, tool_calls};

    fn key() -> SecretString {
        SecretString::from("sk-test")
    }

    fn transcript() -> Vec<Message> {
        vec![Message::system("system"), Message::user("Research ACME GmbH")]
    }

    fn upstream(message: &str) -> AiError {
        AiError::Upstream {
            status: Some(503),
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_tool_path_success_needs_no_fallback() {
        let client = ScriptedClient::new(vec![
            Ok(tool_calls(vec![tool_call("c1", WEB_SEARCH_TOOL, "{}")])),
            Ok(stop("searched")),
        ]);

        let answer = answer_with_search(&client, transcript(), &key())
            .await
            .expect("answer");

        assert_eq!(answer, "searched");
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_phase_one_failure_falls_back_once() {
        let client = ScriptedClient::new(vec![Err(upstream("tools unavailable")), Ok(stop("plain"))]);

        let answer = answer_with_search(&client, transcript(), &key())
            .await
            .expect("answer");

        assert_eq!(answer, "plain");
        let calls = client.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].tools.is_some());
        assert!(calls[1].tools.is_none());
        assert_eq!(calls[1].messages, transcript());
    }

    #[tokio::test]
    async fn test_phase_two_failure_falls_back_with_original_transcript() {
        let client = ScriptedClient::new(vec![
            Ok(tool_calls(vec![tool_call("c1", WEB_SEARCH_TOOL, "{}")])),
            Err(upstream("phase two")),
            Ok(stop("fallback answer")),
        ]);

        let answer = answer_with_search(&client, transcript(), &key())
            .await
            .expect("answer");

        assert_eq!(answer, "fallback answer");
        let calls = client.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[2].messages, transcript());
        assert!(calls[2].tools.is_none());
    }

    #[tokio::test]
    async fn test_protocol_error_falls_back() {
        let client = ScriptedClient::new(vec![Ok(tool_calls(vec![])), Ok(stop("plain"))]);

        let answer = answer_with_search(&client, transcript(), &key())
            .await
            .expect("answer");

        assert_eq!(answer, "plain");
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_double_failure_reports_second_error_only() {
        let client = ScriptedClient::new(vec![Err(upstream("first")), Err(upstream("second"))]);

        let err = answer_with_search(&client, transcript(), &key())
            .await
            .expect_err("should fail");

        match err {
            AiError::AnalysisFailed(inner) => {
                assert!(matches!(*inner, AiError::Upstream { ref message, .. } if message == "second"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(client.calls().len(), 2);
    }
}
