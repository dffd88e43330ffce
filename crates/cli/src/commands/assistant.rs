//! Ask the business assistant from a terminal.
//!
//! Runs the same flows as the `/api/ai/*` endpoints against the data file.
//! The API key comes from `--api-key` or `LLM_API_KEY`.

use std::path::Path;

use secrecy::SecretString;

use leafspring_crm_core::CustomerId;
use leafspring_crm_server::config::CrmConfig;
use leafspring_crm_server::llm::ChatClient;
use leafspring_crm_server::services::AssistantService;
use leafspring_crm_server::store::Store;

use super::CliError;

/// Which assistant flow to run.
#[derive(Debug, Clone)]
pub enum Question {
    General(String),
    CompanyResearch(String),
    CustomerAnalysis(CustomerId),
}

/// Run one assistant flow and return its answer.
///
/// # Errors
///
/// Returns an error if the data file cannot be opened or the assistant fails.
pub async fn answer(
    config: &CrmConfig,
    data_file: &Path,
    question: Question,
    credential: &SecretString,
) -> Result<String, CliError> {
    let store = Store::open(data_file).await?;
    let client = ChatClient::new(&config.llm)?;
    let assistant = AssistantService::new(&client, &store);

    tracing::info!(model = client.model(), "Asking the assistant");

    let answer = match question {
        Question::General(message) => assistant.ask(&message, credential).await?,
        Question::CompanyResearch(query) => assistant.research_company(&query, credential).await?,
        Question::CustomerAnalysis(id) => assistant.analyze_customer(&id, credential).await?,
    };
    Ok(answer)
}
