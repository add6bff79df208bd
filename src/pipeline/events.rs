use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::errors::PipelineError;

/// Lifecycle state carried by a `status` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Started,
    Finished,
}

// ── Proposal events ──────────────────────────────────────────────────

/// One event of a generation run.
///
/// The event kind travels separately (the SSE `event:` line), so the
/// serialized form is just the payload object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProposalEvent {
    Status { agent: String, status: AgentStatus },
    Summary { agent: String, summary: String },
    Token { token: String },
    Done { html: String },
    Error { error: String },
}

impl ProposalEvent {
    pub fn started(agent: &str) -> Self {
        Self::Status {
            agent: agent.to_string(),
            status: AgentStatus::Started,
        }
    }

    pub fn finished(agent: &str) -> Self {
        Self::Status {
            agent: agent.to_string(),
            status: AgentStatus::Finished,
        }
    }

    pub fn summary(agent: &str, summary: impl Into<String>) -> Self {
        Self::Summary {
            agent: agent.to_string(),
            summary: summary.into(),
        }
    }

    pub fn token(token: impl Into<String>) -> Self {
        Self::Token {
            token: token.into(),
        }
    }

    pub fn done(html: impl Into<String>) -> Self {
        Self::Done { html: html.into() }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
        }
    }

    /// SSE event name: `status`, `summary`, `token`, `done` or `error`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Summary { .. } => "summary",
            Self::Token { .. } => "token",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    /// JSON payload for the SSE `data:` line.
    pub fn data(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Whether no further events follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}

// ── Event sink ───────────────────────────────────────────────────────

/// Sending half of a run's event channel.
///
/// The orchestrator is the only writer, so the receiver sees events in
/// exactly the order they were emitted.
#[derive(Debug)]
pub struct EventSink {
    tx: mpsc::Sender<ProposalEvent>,
}

impl EventSink {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ProposalEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Deliver one event, waiting for channel capacity.
    ///
    /// Fails with [`PipelineError::Disconnected`] once the receiver is gone.
    pub async fn emit(&self, event: ProposalEvent) -> Result<(), PipelineError> {
        tracing::trace!(kind = event.kind(), "emit");
        self.tx
            .send(event)
            .await
            .map_err(|_| PipelineError::Disconnected)
    }
}
