use super::Role;
use crate::errors::LlmError;
use crate::llm::{ChatRequest, LlmClient};

pub const SPECIALIST_TEMPERATURE: f32 = 0.7;
pub const SPECIALIST_MAX_TOKENS: u32 = 2000;

/// Build the request a specialist sends for its section.
pub fn specialist_request(role: Role, context: &str) -> ChatRequest {
    ChatRequest::new(
        role.instruction(),
        format!("Context:\n{context}\n\nPlease provide your section."),
    )
    .with_temperature(SPECIALIST_TEMPERATURE)
    .with_max_tokens(SPECIALIST_MAX_TOKENS)
}

/// Ask the LLM to write `role`'s section. The text is returned verbatim
/// and failures are passed through unchanged.
pub async fn run_specialist(
    client: &dyn LlmClient,
    role: Role,
    context: &str,
) -> Result<String, LlmError> {
    tracing::debug!(agent = role.display_name(), "specialist request sent");
    client.complete(specialist_request(role, context)).await
}
