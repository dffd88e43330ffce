//! CLI command implementations.

pub mod assistant;
pub mod seed;
pub mod user;

use std::path::PathBuf;

use thiserror::Error;

use leafspring_crm_server::config::ConfigError;
use leafspring_crm_server::llm::AiError;
use leafspring_crm_server::services::{AssistantError, AuthError};
use leafspring_crm_server::store::StoreError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Assistant(#[from] AssistantError),

    #[error("failed to build LLM client: {0}")]
    Llm(#[from] AiError),

    #[error("invalid role: {0}. Valid roles: admin, staff")]
    InvalidRole(String),

    #[error("data file already exists: {0} (use --force to overwrite)")]
    DataFileExists(PathBuf),
}
