//! Terminal generation command — `proposer generate`.
//!
//! The editor's markdown goes to stdout as it streams; agent progress and
//! summaries go to stderr so the output can be redirected to a file.

use anyhow::{Context, Result};
use console::style;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use proposer::config::Settings;
use proposer::context::resolve_context;
use proposer::llm::OpenAiClient;
use proposer::pipeline::{AgentStatus, Orchestrator, ProposalEvent};

pub async fn cmd_generate(settings: &Settings, context_file: Option<&Path>) -> Result<()> {
    for warning in settings.validate() {
        eprintln!("{} {}", style("warning:").yellow().bold(), warning);
    }

    let context = match context_file {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read context file: {}", path.display()))?,
        ),
        None => None,
    };
    let context = resolve_context(context);

    let client = OpenAiClient::new(settings.llm_config()).context("Failed to build LLM client")?;
    let orchestrator = Orchestrator::new(Arc::new(client), settings.pipeline_config());
    let (sink, mut rx) = orchestrator.channel();

    let run = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.run(context, sink).await }
    });

    let mut stdout = std::io::stdout();
    while let Some(event) = rx.recv().await {
        match event {
            ProposalEvent::Status { agent, status } => match status {
                AgentStatus::Started => {
                    eprintln!("{} {}", style("▶").cyan(), style(agent).bold());
                }
                AgentStatus::Finished => {
                    eprintln!("{} {}", style("✓").green(), agent);
                }
            },
            ProposalEvent::Summary { agent, summary } => {
                eprintln!("  {} {}", style(format!("{}:", agent)).dim(), summary);
            }
            ProposalEvent::Token { token } => {
                write!(stdout, "{}", token)?;
                stdout.flush()?;
            }
            ProposalEvent::Done { .. } => {
                writeln!(stdout)?;
            }
            // Reported once the run's result reaches `main`.
            ProposalEvent::Error { .. } => {}
        }
    }

    let proposal = run.await.context("Generation task failed to complete")??;
    eprintln!(
        "{} {} sections, {} characters",
        style("Done:").green().bold(),
        proposal.sections.len(),
        proposal.markdown.len()
    );
    Ok(())
}
