//! Web server command — `proposer serve`.

use anyhow::{Context, Result};
use std::sync::Arc;

use proposer::config::Settings;
use proposer::llm::OpenAiClient;
use proposer::pipeline::Orchestrator;
use proposer::web::{AppState, start_server};

pub async fn cmd_serve(
    settings: &Settings,
    port: Option<u16>,
    host: Option<String>,
    open: bool,
    dev: bool,
) -> Result<()> {
    for warning in settings.validate() {
        tracing::warn!("{}", warning);
    }

    let client = OpenAiClient::new(settings.llm_config()).context("Failed to build LLM client")?;
    tracing::info!(model = client.model(), "using model");

    let state = Arc::new(AppState {
        orchestrator: Orchestrator::new(Arc::new(client), settings.pipeline_config()),
    });

    let mut config = settings.server_config();
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(host) = host {
        config.host = host;
    }
    config.dev_mode = dev;
    // No browser inside dev containers.
    config.open_browser = open && !dev;

    start_server(config, state).await
}
