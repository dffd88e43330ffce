//! Business assistant: CRM-grounded questions answered by the LLM.
//!
//! Each operation takes one fresh snapshot, renders a system prompt from it,
//! and makes a single request/response exchange (or, for company research,
//! the web-search flow with its plain fallback). Nothing is kept between
//! calls.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::instrument;

use leafspring_crm_core::CustomerId;

use crate::llm::{AiError, ChatCompletion, ChatCompletionResponse, Message, answer_with_search};
use crate::prompts::{PromptError, PromptKind, build_system_prompt};
use crate::snapshot::SnapshotProvider;

/// Errors that can occur in the assistant service.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The chat-completion layer failed.
    #[error(transparent)]
    Ai(#[from] AiError),

    /// The question or query was blank.
    #[error("{0} is required")]
    EmptyInput(&'static str),

    /// The customer to analyze does not exist.
    #[error("customer not found")]
    CustomerNotFound(CustomerId),

    /// The system prompt could not be built.
    #[error("prompt error: {0}")]
    Prompt(PromptError),
}

impl From<PromptError> for AssistantError {
    fn from(err: PromptError) -> Self {
        match err {
            PromptError::CustomerNotFound(id) => Self::CustomerNotFound(id),
            other => Self::Prompt(other),
        }
    }
}

/// Business assistant service.
pub struct AssistantService<'a, C, P> {
    client: &'a C,
    snapshots: &'a P,
}

impl<'a, C: ChatCompletion, P: SnapshotProvider> AssistantService<'a, C, P> {
    /// Create a new assistant service.
    #[must_use]
    pub const fn new(client: &'a C, snapshots: &'a P) -> Self {
        Self { client, snapshots }
    }

    /// Answer a free-form question about the CRM data.
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::Ai(AiError::MissingCredential)` before any
    /// request when `credential` is blank, `AssistantError::EmptyInput` for a
    /// blank question, or the client's error.
    #[instrument(skip(self, question, credential))]
    pub async fn ask(&self, question: &str, credential: &SecretString) -> Result<String, AssistantError> {
        require_credential(credential)?;
        let question = require_input(question, "message")?;

        let snapshot = self.snapshots.snapshot();
        let system = build_system_prompt(PromptKind::General, &snapshot)?;
        let messages = [Message::system(system), Message::user(question)];

        Ok(self
            .client
            .complete(&messages, credential, None)
            .await
            .and_then(ChatCompletionResponse::into_answer)?)
    }

    /// Research an outside company, using web search when the upstream allows it.
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::Ai(AiError::MissingCredential)` before any
    /// request when `credential` is blank, `AssistantError::EmptyInput` for a
    /// blank query, or `AiError::AnalysisFailed` when both the search and the
    /// plain attempt fail.
    #[instrument(skip(self, query, credential))]
    pub async fn research_company(
        &self,
        query: &str,
        credential: &SecretString,
    ) -> Result<String, AssistantError> {
        require_credential(credential)?;
        let query = require_input(query, "query")?;

        let snapshot = self.snapshots.snapshot();
        let system = build_system_prompt(PromptKind::CompanyResearch { subject: query }, &snapshot)?;
        let messages = vec![Message::system(system), Message::user(query)];

        Ok(answer_with_search(self.client, messages, credential).await?)
    }

    /// Analyze one customer from their record, orders and inquiries.
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::Ai(AiError::MissingCredential)` before any
    /// request when `credential` is blank, `AssistantError::CustomerNotFound`
    /// for an unknown ID, or the client's error.
    #[instrument(skip(self, credential), fields(customer_id = %customer_id))]
    pub async fn analyze_customer(
        &self,
        customer_id: &CustomerId,
        credential: &SecretString,
    ) -> Result<String, AssistantError> {
        require_credential(credential)?;

        let snapshot = self.snapshots.snapshot();
        let system = build_system_prompt(PromptKind::CustomerAnalysis { customer_id }, &snapshot)?;
        let messages = [
            Message::system(system),
            Message::user("Analyze this customer and recommend next steps."),
        ];

        Ok(self
            .client
            .complete(&messages, credential, None)
            .await
            .and_then(ChatCompletionResponse::into_answer)?)
    }
}

fn require_credential(credential: &SecretString) -> Result<(), AiError> {
    if credential.expose_secret().trim().is_empty() {
        return Err(AiError::MissingCredential);
    }
    Ok(())
}

fn require_input<'s>(value: &'s str, field: &'static str) -> Result<&'s str, AssistantError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AssistantError::EmptyInput(field));
    }
    Ok(value)
}
