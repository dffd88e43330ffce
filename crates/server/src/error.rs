//! Unified error handling for the HTTP surface.
//!
//! Every failure leaves the server as `{ "success": false, "message": ... }`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::llm::AiError;
use crate::services::{AssistantError, AuthError};
use crate::store::StoreError;

/// Errors that stop the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open data store: {0}")]
    Store(#[from] StoreError),
    #[error("failed to seed admin user: {0}")]
    Auth(#[from] AuthError),
    #[error("failed to build LLM client: {0}")]
    Llm(#[from] AiError),
}

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Data store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Business assistant failed.
    #[error(transparent)]
    Assistant(#[from] AssistantError),

    /// Authentication failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(err) => match err {
                StoreError::NotFound => StatusCode::NOT_FOUND,
                StoreError::Invalid(_) => StatusCode::BAD_REQUEST,
                StoreError::Conflict(_) => StatusCode::CONFLICT,
                StoreError::Io(_) | StoreError::Serialization(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Assistant(err) => match err {
                AssistantError::EmptyInput(_) => StatusCode::BAD_REQUEST,
                AssistantError::CustomerNotFound(_) => StatusCode::NOT_FOUND,
                AssistantError::Prompt(_) => StatusCode::INTERNAL_SERVER_ERROR,
                AssistantError::Ai(ai) if ai.is_client_error() => StatusCode::BAD_REQUEST,
                AssistantError::Ai(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::InvalidUser(_) | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                AuthError::Store(_) | AuthError::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message shown to the client.
    fn public_message(&self, status: StatusCode) -> String {
        match self {
            Self::Auth(AuthError::InvalidCredentials) => {
                "Invalid username or password".to_string()
            }
            Self::Store(StoreError::NotFound) => "Record not found".to_string(),
            Self::Store(err) if status.is_client_error() => err.to_string(),
            Self::Assistant(AssistantError::Ai(err)) => ai_public_message(err),
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Shown instead of transport and decoding details, which name the endpoint.
const AI_UNAVAILABLE: &str = "AI service unavailable";

/// Client-facing text of an AI failure: the upstream's own message, or a
/// fixed text when the failure happened on our side of the wire.
fn ai_public_message(err: &AiError) -> String {
    match err {
        AiError::Transport(_) | AiError::Decode(_) => AI_UNAVAILABLE.to_string(),
        AiError::AnalysisFailed(inner) => format!("AI analysis failed: {}", ai_public_message(inner)),
        other => other.to_string(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "CRM request error"
            );
        }

        let message = self.public_message(status);
        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Set the Sentry user context for the authenticated user.
pub fn set_sentry_user(user_id: &str, username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}
