//! Typed error hierarchy for the proposal generator.
//!
//! Two enums cover the two layers that can fail during a generation run:
//! - `LlmError` — a single request to the chat-completion service
//! - `PipelineError` — a generation run that cannot continue

use thiserror::Error;

/// Errors from the LLM client. No variant is retried internally.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("No API key configured: set the {env_var} environment variable")]
    MissingApiKey { env_var: String },

    #[error("LLM request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("LLM API returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("LLM stream reported an error: {0}")]
    Stream(String),

    #[error("Failed to decode LLM response: {0}")]
    Decode(String),

    #[error("LLM response contained no content")]
    EmptyResponse,
}

/// Errors that end a generation run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{agent} failed: {source}")]
    Specialist {
        agent: &'static str,
        #[source]
        source: LlmError,
    },

    #[error("Specialist task aborted: {0}")]
    TaskAborted(String),

    #[error("Editor failed: {0}")]
    Editor(#[source] LlmError),

    #[error("Event receiver disconnected")]
    Disconnected,
}

impl PipelineError {
    /// Whether the run can still report this failure to its listener.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, Self::Disconnected)
    }
}
