use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{
        Html, IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::ReceiverStream;

use super::embedded;
use crate::context::{DEFAULT_CONTEXT, resolve_context};
use crate::pipeline::{Orchestrator, ProposalEvent};

/// Interval between SSE keep-alive comments.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub orchestrator: Orchestrator,
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    pub context: Option<String>,
}

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/generate_agentic_stream", get(generate_agentic_stream))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn index() -> Result<Html<String>, ApiError> {
    embedded::render_index(DEFAULT_CONTEXT)
        .map(Html)
        .ok_or_else(|| ApiError::Internal("Page template missing from build".to_string()))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Start a generation run and stream its events back as SSE.
async fn generate_agentic_stream(
    State(state): State<SharedState>,
    Query(query): Query<GenerateQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let context = resolve_context(query.context);
    let orchestrator = state.orchestrator.clone();
    let (sink, rx) = orchestrator.channel();

    tokio::spawn(async move {
        // The outcome has already been reported through the event stream.
        let _ = orchestrator.run(context, sink).await;
    });

    let events = ReceiverStream::new(rx).map(|event| Ok(sse_event(&event)));
    Sse::new(events).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
}

fn sse_event(event: &ProposalEvent) -> Event {
    Event::default().event(event.kind()).data(event.data())
}
