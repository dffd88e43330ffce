//! LLM chat-completion integration.
//!
//! - [`client`]: one request/response exchange with the upstream
//! - [`orchestrator`]: the two-phase tool-use protocol
//! - [`fallback`]: web search with a plain-completion fallback

pub mod client;
pub mod error;
pub mod fallback;
pub mod orchestrator;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ChatClient, ChatCompletion};
pub use error::AiError;
pub use fallback::{WEB_SEARCH_TOOL, answer_with_search};
pub use orchestrator::{ToolStep, advance, complete_with_tool};
pub use types::{ChatCompletionResponse, Message, ToolCall, ToolDeclaration};
