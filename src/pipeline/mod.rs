//! Generation run orchestration.
//!
//! ## Overview
//!
//! A run turns one business context into a finished proposal:
//!
//! ```text
//!  started ×5 ──> JoinSet (5 specialists, concurrent)
//!                    │  join_next() in completion order
//!                    v
//!               finished ─> summarize ─> summary      (per role)
//!                    │
//!                    v  all five collected
//!               Editor started ─> token … token ─> Editor finished ─> done(html)
//! ```
//!
//! Every event goes through one [`EventSink`], written only by the run
//! itself, so concurrent specialist completions reach the listener as a
//! single ordered stream.
//!
//! ## Failure
//!
//! The first specialist or editor failure emits one `error` event and ends
//! the run. Specialists still in flight are aborted when the `JoinSet` is
//! dropped. Summarizer failures never end a run.

pub mod events;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::Instrument;
use uuid::Uuid;

use crate::agents::{
    EDITOR_NAME, Role, SectionResults, run_specialist, stream_editor, summarize_section,
};
use crate::errors::PipelineError;
use crate::llm::LlmClient;
use crate::render::render_markdown;

pub use events::{AgentStatus, EventSink, ProposalEvent};

/// Default pause between the initial `started` events.
pub const DEFAULT_STAGGER: Duration = Duration::from_millis(200);

/// Default capacity of a run's event channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Tunables for a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Pause between the initial `started` events. Cosmetic only.
    pub stagger: Duration,
    /// Capacity of the per-run event channel.
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stagger: DEFAULT_STAGGER,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Output of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub sections: SectionResults,
    pub markdown: String,
    pub html: String,
}

/// Drives generation runs against a shared LLM client.
///
/// Cloning is cheap; every run owns its own context and section map.
#[derive(Clone)]
pub struct Orchestrator {
    client: Arc<dyn LlmClient>,
    config: PipelineConfig,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn LlmClient>, config: PipelineConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Open an event channel sized for this orchestrator.
    pub fn channel(&self) -> (EventSink, tokio::sync::mpsc::Receiver<ProposalEvent>) {
        EventSink::channel(self.config.channel_capacity)
    }

    /// Execute one generation run, reporting progress through `sink`.
    ///
    /// On failure a single `error` event is emitted (unless the listener is
    /// already gone) and nothing follows it. The sink is dropped when the
    /// run returns, which closes the listener's stream.
    pub async fn run(&self, context: String, sink: EventSink) -> Result<Proposal, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("generation", %run_id);

        async move {
            tracing::info!(context_chars = context.chars().count(), "generation started");
            match self.execute(context, &sink).await {
                Ok(proposal) => {
                    tracing::info!(
                        markdown_chars = proposal.markdown.len(),
                        "generation finished"
                    );
                    Ok(proposal)
                }
                Err(err) => {
                    if err.is_reportable() {
                        tracing::error!(error = %err, "generation failed");
                        // Listener may disconnect concurrently; nothing left to do then.
                        let _ = sink.emit(ProposalEvent::error(err.to_string())).await;
                    } else {
                        tracing::info!("listener disconnected; generation abandoned");
                    }
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, context: String, sink: &EventSink) -> Result<Proposal, PipelineError> {
        for (i, role) in Role::ALL.into_iter().enumerate() {
            if i > 0 && !self.config.stagger.is_zero() {
                tokio::time::sleep(self.config.stagger).await;
            }
            sink.emit(ProposalEvent::started(role.display_name())).await?;
        }

        let context: Arc<str> = Arc::from(context);
        let sections = self.collect_sections(&context, sink).await?;

        sink.emit(ProposalEvent::started(EDITOR_NAME)).await?;
        let markdown = stream_editor(self.client.as_ref(), &context, &sections, sink).await?;
        sink.emit(ProposalEvent::finished(EDITOR_NAME)).await?;

        let html = render_markdown(&markdown);
        sink.emit(ProposalEvent::done(html.clone())).await?;

        Ok(Proposal {
            sections,
            markdown,
            html,
        })
    }

    /// Run all specialists concurrently and gather their sections in
    /// completion order, summarizing each as it lands.
    async fn collect_sections(
        &self,
        context: &Arc<str>,
        sink: &EventSink,
    ) -> Result<SectionResults, PipelineError> {
        let mut tasks = JoinSet::new();
        for role in Role::ALL {
            let client = Arc::clone(&self.client);
            let context = Arc::clone(context);
            tasks.spawn(
                async move { (role, run_specialist(client.as_ref(), role, &context).await) }
                    .in_current_span(),
            );
        }
        tracing::info!(specialists = tasks.len(), "specialists dispatched");

        let mut sections = SectionResults::new();
        while let Some(joined) = tasks.join_next().await {
            let (role, result) = joined.map_err(|err| PipelineError::TaskAborted(err.to_string()))?;
            let text = result.map_err(|source| PipelineError::Specialist {
                agent: role.display_name(),
                source,
            })?;
            tracing::debug!(agent = role.display_name(), chars = text.len(), "specialist finished");

            sink.emit(ProposalEvent::finished(role.display_name())).await?;
            let summary = summarize_section(self.client.as_ref(), role.display_name(), &text).await;
            sections.insert(role, text);
            sink.emit(ProposalEvent::summary(role.display_name(), summary)).await?;
        }

        Ok(sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{combined_sections, fallback_summary};
    use crate::llm::mock::{
        CallKind, EditorScript, Reply, ScriptedClient, default_reply, section_text,
    };

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            stagger: Duration::ZERO,
            channel_capacity: 8,
        }
    }

    /// Run to completion while draining the channel concurrently.
    async fn run_collect(
        client: Arc<ScriptedClient>,
        context: &str,
    ) -> (Result<Proposal, PipelineError>, Vec<ProposalEvent>) {
        let orchestrator = Orchestrator::new(client, test_config());
        let (sink, mut rx) = orchestrator.channel();
        let context = context.to_string();
        let handle = tokio::spawn(async move { orchestrator.run(context, sink).await });

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        (handle.await.unwrap(), events)
    }

    fn position(events: &[ProposalEvent], wanted: &ProposalEvent) -> Option<usize> {
        events.iter().position(|e| e == wanted)
    }

    fn summary_position(events: &[ProposalEvent], agent: &str) -> Option<usize> {
        events
            .iter()
            .position(|e| matches!(e, ProposalEvent::Summary { agent: a, .. } if a == agent))
    }

    fn tokens(events: &[ProposalEvent]) -> String {
        events
            .iter()
            .filter_map(|e| match e {
                ProposalEvent::Token { token } => Some(token.as_str()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_happy_path_event_sequence() {
        let client = Arc::new(ScriptedClient::happy(&[
            "# Executive Summary\n",
            "Digital first.\n",
        ]));
        let (result, events) = run_collect(client, "ctx").await;
        let proposal = result.unwrap();

        // Five started events in fixed role order come first.
        for (i, role) in Role::ALL.iter().enumerate() {
            assert_eq!(events[i], ProposalEvent::started(role.display_name()));
        }

        // started -> finished -> summary per role.
        for role in Role::ALL {
            let name = role.display_name();
            let started = position(&events, &ProposalEvent::started(name)).unwrap();
            let finished = position(&events, &ProposalEvent::finished(name)).unwrap();
            let summary = summary_position(&events, name).unwrap();
            assert!(started < finished && finished < summary, "{name} out of order");
        }

        // Editor starts only after every summary, and finishes before done.
        let editor_started = position(&events, &ProposalEvent::started(EDITOR_NAME)).unwrap();
        let editor_finished = position(&events, &ProposalEvent::finished(EDITOR_NAME)).unwrap();
        for role in Role::ALL {
            assert!(summary_position(&events, role.display_name()).unwrap() < editor_started);
        }
        assert!(editor_started < editor_finished);

        let last = events.last().unwrap();
        assert_eq!(last, &ProposalEvent::done(proposal.html.clone()));
        assert_eq!(editor_finished, events.len() - 2);
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);

        assert_eq!(proposal.markdown, "# Executive Summary\nDigital first.\n");
        assert_eq!(proposal.sections.len(), 5);
    }

    #[tokio::test]
    async fn test_tokens_concatenate_to_rendered_document() {
        let fragments = ["## Risks", " & Mitigation\n\n", "| Risk | Mitigation |\n", "|---|---|\n", "| FX | Hedge |\n"];
        let client = Arc::new(ScriptedClient::happy(&fragments));
        let (result, events) = run_collect(client, "ctx").await;
        let proposal = result.unwrap();

        let concatenated = tokens(&events);
        assert_eq!(concatenated, fragments.concat());
        assert_eq!(concatenated, proposal.markdown);
        match events.last().unwrap() {
            ProposalEvent::Done { html } => {
                assert_eq!(html, &render_markdown(&concatenated));
                assert!(html.contains("<table>"));
            }
            other => panic!("expected done, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_collects_in_completion_order() {
        let client = Arc::new(ScriptedClient::new(
            |kind, _| match kind {
                CallKind::Specialist(Role::RiskSpecialist) => default_reply(kind),
                CallKind::Specialist(_) => default_reply(kind).after(Duration::from_millis(150)),
                _ => default_reply(kind),
            },
            EditorScript::Fragments(vec!["done".into()]),
        ));
        let (result, events) = run_collect(client, "ctx").await;
        result.unwrap();

        let first_finished = events
            .iter()
            .find(|e| matches!(e, ProposalEvent::Status { status: AgentStatus::Finished, .. }))
            .unwrap();
        assert_eq!(first_finished, &ProposalEvent::finished("Risk Specialist"));
    }

    #[tokio::test]
    async fn test_specialists_run_concurrently() {
        let client = Arc::new(ScriptedClient::new(
            |kind, _| match kind {
                CallKind::Specialist(_) => default_reply(kind).after(Duration::from_millis(200)),
                _ => default_reply(kind),
            },
            EditorScript::Fragments(vec!["x".into()]),
        ));
        let started = std::time::Instant::now();
        let (result, _) = run_collect(client, "ctx").await;
        result.unwrap();
        // Sequential execution would take at least 1s.
        assert!(started.elapsed() < Duration::from_millis(900));
    }

    #[tokio::test]
    async fn test_editor_receives_combined_sections_and_context() {
        let client = Arc::new(ScriptedClient::happy(&["ok"]));
        let (result, _) = run_collect(Arc::clone(&client), "Al Noor context").await;
        let proposal = result.unwrap();

        let expected_sections: SectionResults =
            Role::ALL.into_iter().map(|r| (r, section_text(r))).collect();
        assert_eq!(proposal.sections, expected_sections);

        let requests = client.requests();
        let editor = requests.last().unwrap();
        let user = editor.user_prompt().unwrap();
        assert!(user.starts_with("Context:\nAl Noor context\n\nSections from team:\n"));
        assert!(user.contains(&combined_sections(&expected_sections)));

        // Every specialist saw the same context.
        let specialist_requests: Vec<_> = requests
            .iter()
            .filter(|r| matches!(CallKind::of(r), CallKind::Specialist(_)))
            .collect();
        assert_eq!(specialist_requests.len(), 5);
        for request in specialist_requests {
            assert!(request.user_prompt().unwrap().contains("Al Noor context"));
        }
    }

    #[tokio::test]
    async fn test_specialist_failure_emits_single_error_and_stops() {
        let client = Arc::new(ScriptedClient::new(
            |kind, _| match kind {
                CallKind::Specialist(Role::FinancialAnalyst) => Reply::fail("invalid api key"),
                CallKind::Specialist(_) => default_reply(kind).after(Duration::from_millis(100)),
                _ => default_reply(kind),
            },
            EditorScript::Fragments(vec!["never".into()]),
        ));
        let (result, events) = run_collect(Arc::clone(&client), "ctx").await;

        let err = result.unwrap_err();
        assert!(matches!(err, PipelineError::Specialist { agent: "Financial Analyst", .. }));

        let errors: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, ProposalEvent::Error { .. }))
            .collect();
        assert_eq!(errors.len(), 1);
        match events.last().unwrap() {
            ProposalEvent::Error { error } => assert!(error.contains("invalid api key")),
            other => panic!("expected error last, got {other:?}"),
        }
        assert!(!events.iter().any(|e| matches!(e, ProposalEvent::Token { .. } | ProposalEvent::Done { .. })));
        assert!(position(&events, &ProposalEvent::started(EDITOR_NAME)).is_none());
        assert!(position(&events, &ProposalEvent::finished("Financial Analyst")).is_none());

        // The editor was never called.
        assert!(client.requests().iter().all(|r| matches!(
            CallKind::of(r),
            CallKind::Specialist(_) | CallKind::Summary
        )));
    }

    #[tokio::test]
    async fn test_specialist_failure_abandons_slow_specialists() {
        let client = Arc::new(ScriptedClient::new(
            |kind, _| match kind {
                CallKind::Specialist(Role::MarketAnalyst) => Reply::fail("boom"),
                CallKind::Specialist(_) => default_reply(kind).after(Duration::from_secs(30)),
                _ => default_reply(kind),
            },
            EditorScript::Fragments(vec!["never".into()]),
        ));
        let started = std::time::Instant::now();
        let (result, events) = run_collect(client, "ctx").await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(matches!(
            result,
            Err(PipelineError::Specialist { agent: "Market Analyst", .. })
        ));

        assert_eq!(events.len(), 6);
        for (i, role) in Role::ALL.iter().enumerate() {
            assert_eq!(events[i], ProposalEvent::started(role.display_name()));
        }
        match &events[5] {
            ProposalEvent::Error { error } => assert!(error.contains("Market Analyst failed")),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_summary_failure_falls_back_and_run_completes() {
        let client = Arc::new(ScriptedClient::new(
            |kind, request| match kind {
                CallKind::Summary
                    if request
                        .user_prompt()
                        .is_some_and(|u| u.starts_with("Problem Analyst")) =>
                {
                    Reply::fail("summary timeout")
                }
                _ => default_reply(kind),
            },
            EditorScript::Fragments(vec!["final".into()]),
        ));
        let (result, events) = run_collect(client, "ctx").await;
        result.unwrap();

        assert!(events.contains(&ProposalEvent::summary(
            "Problem Analyst",
            fallback_summary("Problem Analyst")
        )));
        assert!(events.contains(&ProposalEvent::summary("Market Analyst", "A one-line summary.")));
        assert!(matches!(events.last(), Some(ProposalEvent::Done { .. })));
    }

    #[tokio::test]
    async fn test_editor_open_failure_reports_error() {
        let client = Arc::new(ScriptedClient::new(
            |kind, _| default_reply(kind),
            EditorScript::FailOnOpen("context length exceeded".into()),
        ));
        let (result, events) = run_collect(client, "ctx").await;

        assert!(matches!(result, Err(PipelineError::Editor(_))));
        assert!(events.contains(&ProposalEvent::started(EDITOR_NAME)));
        match events.last().unwrap() {
            ProposalEvent::Error { error } => assert!(error.contains("context length exceeded")),
            other => panic!("expected error, got {other:?}"),
        }
        assert!(!events.iter().any(|e| matches!(e, ProposalEvent::Done { .. })));
        assert!(!events.contains(&ProposalEvent::finished(EDITOR_NAME)));
    }

    #[tokio::test]
    async fn test_editor_mid_stream_failure_keeps_sent_tokens_then_errors() {
        let client = Arc::new(ScriptedClient::new(
            |kind, _| default_reply(kind),
            EditorScript::FailAfter(
                vec!["# Executive".into(), " Summary".into()],
                "connection reset".into(),
            ),
        ));
        let (result, events) = run_collect(client, "ctx").await;

        assert!(result.is_err());
        assert_eq!(tokens(&events), "# Executive Summary");
        let error_at = events
            .iter()
            .position(|e| matches!(e, ProposalEvent::Error { .. }))
            .unwrap();
        assert_eq!(error_at, events.len() - 1);
        assert!(!events.iter().any(|e| matches!(e, ProposalEvent::Done { .. })));
    }

    #[tokio::test]
    async fn test_run_abandons_when_listener_disconnects() {
        let client = Arc::new(ScriptedClient::happy(&["a", "b"]));
        let orchestrator = Orchestrator::new(client, test_config());
        let (sink, rx) = orchestrator.channel();
        drop(rx);

        let err = orchestrator.run("ctx".into(), sink).await.unwrap_err();
        assert!(matches!(err, PipelineError::Disconnected));
    }

    #[tokio::test]
    async fn test_concurrent_runs_are_independent() {
        let client = Arc::new(ScriptedClient::happy(&["shared"]));
        let (first, second) = tokio::join!(
            run_collect(Arc::clone(&client), "first context"),
            run_collect(Arc::clone(&client), "second context"),
        );
        assert!(first.0.is_ok() && second.0.is_ok());
        assert_eq!(first.1.len(), second.1.len());

        let editor_prompts: Vec<String> = client
            .requests()
            .iter()
            .filter(|r| CallKind::of(r) == CallKind::Other)
            .map(|r| r.user_prompt().unwrap().to_string())
            .collect();
        assert_eq!(editor_prompts.len(), 2);
        assert!(editor_prompts.iter().any(|p| p.contains("first context")));
        assert!(editor_prompts.iter().any(|p| p.contains("second context")));
    }

    #[test]
    fn test_pipeline_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.stagger, Duration::from_millis(200));
        assert_eq!(config.channel_capacity, 64);
    }
}
