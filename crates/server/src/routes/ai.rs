//! Business assistant endpoints.
//!
//! The caller supplies the upstream API key with every request; it is
//! wrapped in a `SecretString` immediately and never stored.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use leafspring_crm_core::CustomerId;

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::routes::ApiJson;
use crate::services::AssistantService;
use crate::state::AppState;

/// Build the assistant router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/ai/chat", post(chat))
        .route("/api/ai/research-company", post(research_company))
        .route("/api/ai/analyze-customer/{id}", post(analyze_customer))
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// A general question.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub api_key: String,
}

/// A company to research.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub api_key: String,
}

/// Credentials for a customer analysis.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub api_key: String,
}

/// The assistant's answer.
#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub success: bool,
    pub response: String,
}

impl AnswerResponse {
    const fn new(response: String) -> Self {
        Self {
            success: true,
            response,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn chat(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let credential = SecretString::from(request.api_key);
    let answer = AssistantService::new(state.llm(), state.store())
        .ask(&request.message, &credential)
        .await?;
    Ok(Json(AnswerResponse::new(answer)))
}

async fn research_company(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    ApiJson(request): ApiJson<ResearchRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let credential = SecretString::from(request.api_key);
    let answer = AssistantService::new(state.llm(), state.store())
        .research_company(&request.query, &credential)
        .await?;
    Ok(Json(AnswerResponse::new(answer)))
}

async fn analyze_customer(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Path(id): Path<CustomerId>,
    ApiJson(request): ApiJson<AnalyzeRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let credential = SecretString::from(request.api_key);
    let answer = AssistantService::new(state.llm(), state.store())
        .analyze_customer(&id, &credential)
        .await?;
    Ok(Json(AnswerResponse::new(answer)))
}
