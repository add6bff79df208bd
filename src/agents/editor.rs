use futures::StreamExt;

use super::{EDITOR_INSTRUCTION, Role, SectionResults};
use crate::errors::PipelineError;
use crate::llm::{ChatRequest, LlmClient};
use crate::pipeline::events::{EventSink, ProposalEvent};

pub const EDITOR_TEMPERATURE: f32 = 0.7;
pub const EDITOR_MAX_TOKENS: u32 = 4000;

/// Lay out the specialist sections under their fixed headings, in role order.
///
/// Roles missing from `sections` are emitted with an empty body so the
/// heading sequence never changes.
pub fn combined_sections(sections: &SectionResults) -> String {
    Role::ALL
        .iter()
        .map(|role| {
            let body = sections.get(role).map(String::as_str).unwrap_or_default();
            format!("## {}\n{}\n", role.heading(), body)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn editor_request(context: &str, combined: &str) -> ChatRequest {
    ChatRequest::new(
        EDITOR_INSTRUCTION,
        format!(
            "Context:\n{context}\n\nSections from team:\n{combined}\n\nPlease produce the final proposal."
        ),
    )
    .with_temperature(EDITOR_TEMPERATURE)
    .with_max_tokens(EDITOR_MAX_TOKENS)
}

/// Run the editor pass, forwarding each fragment as a `token` event as soon
/// as it arrives and returning the accumulated document.
///
/// The next fragment is only requested after the previous one has been
/// handed to `sink`.
pub async fn stream_editor(
    client: &dyn LlmClient,
    context: &str,
    sections: &SectionResults,
    sink: &EventSink,
) -> Result<String, PipelineError> {
    let combined = combined_sections(sections);
    let mut tokens = client
        .stream(editor_request(context, &combined))
        .await
        .map_err(PipelineError::Editor)?;

    let mut document = String::new();
    while let Some(fragment) = tokens.next().await {
        let fragment = fragment.map_err(PipelineError::Editor)?;
        document.push_str(&fragment);
        sink.emit(ProposalEvent::token(fragment)).await?;
    }
    Ok(document)
}
