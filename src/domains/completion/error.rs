//! Completion-specific error types.

use thiserror::Error;

/// Errors that can occur while obtaining a completion.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// No API key is configured.
    #[error("completion API key not configured (set GATEWAY_OPENAI_API_KEY or OPENAI_API_KEY)")]
    MissingApiKey,

    /// The API answered with a non-success status.
    #[error("completion API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The API answered without any choices.
    #[error("completion API returned no choices")]
    EmptyResponse,

    /// The model kept requesting tools.
    #[error("model still requesting tools after {0} rounds")]
    ToolRoundsExhausted(usize),

    /// Transport-level failure talking to the API.
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),
}
