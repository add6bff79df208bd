use super::SUMMARY_INSTRUCTION;
use crate::llm::{ChatRequest, LlmClient};

/// Only this many leading characters of a section are summarized.
pub const SUMMARY_INPUT_CHARS: usize = 1000;
pub const SUMMARY_TEMPERATURE: f32 = 0.3;
pub const SUMMARY_MAX_TOKENS: u32 = 30;

/// Fixed summary used whenever the summarizer call does not succeed.
pub fn fallback_summary(agent_name: &str) -> String {
    format!("{agent_name} completed.")
}

/// The leading `SUMMARY_INPUT_CHARS` characters of `text`.
fn summary_input(text: &str) -> &str {
    match text.char_indices().nth(SUMMARY_INPUT_CHARS) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

pub fn summary_request(section_text: &str) -> ChatRequest {
    ChatRequest::new(SUMMARY_INSTRUCTION, summary_input(section_text))
        .with_temperature(SUMMARY_TEMPERATURE)
        .with_max_tokens(SUMMARY_MAX_TOKENS)
}

/// Condense a finished section into one line.
///
/// Best effort: any failure, or a blank reply, yields
/// [`fallback_summary`] instead of an error.
pub async fn summarize_section(client: &dyn LlmClient, agent_name: &str, section_text: &str) -> String {
    match client.complete(summary_request(section_text)).await {
        Ok(summary) if !summary.trim().is_empty() => summary.trim().to_string(),
        Ok(_) => {
            tracing::warn!(agent = agent_name, "summarizer returned blank text; using fallback");
            fallback_summary(agent_name)
        }
        Err(err) => {
            tracing::warn!(agent = agent_name, error = %err, "summarizer failed; using fallback");
            fallback_summary(agent_name)
        }
    }
}
