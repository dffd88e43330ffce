//! Error types for the chat-completion layer.

use thiserror::Error;

/// Errors that can occur when talking to the chat-completion API.
///
/// The client and the tool-use orchestrator never recover from these; only
/// the search fallback does, and it reports a double failure as
/// [`AiError::AnalysisFailed`].
#[derive(Debug, Error)]
pub enum AiError {
    /// No API key was supplied by the caller.
    #[error("an AI API key is required")]
    MissingCredential,

    /// The request violated a precondition (e.g. an empty transcript).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network or connection failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream reported an error.
    #[error("upstream error: {message}")]
    Upstream {
        /// HTTP status, if the error came with one.
        status: Option<u16>,
        /// Error message from the upstream.
        message: String,
    },

    /// The response body could not be decoded into the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// A `tool_calls` response lacked the expected tool-call structure.
    #[error("unexpected tool call shape: {0}")]
    ProtocolShape(String),

    /// Both the tool-enabled path and its plain fallback failed.
    ///
    /// Carries the fallback's failure only.
    #[error("AI analysis failed: {0}")]
    AnalysisFailed(#[source] Box<AiError>),
}

impl AiError {
    /// Short, stable name of the error kind, suitable for log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Transport(_) => "transport",
            Self::Upstream { .. } => "upstream",
            Self::Decode(_) => "decode",
            Self::ProtocolShape(_) => "protocol_shape",
            Self::AnalysisFailed(_) => "analysis_failed",
        }
    }

    /// Whether the error was caused by the caller rather than the upstream.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingCredential | Self::InvalidRequest(_))
    }
}
