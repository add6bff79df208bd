//! Scripted [`LlmClient`] for driving the pipeline in tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use super::{ChatRequest, LlmClient, TokenStream};
use crate::agents::{Role, SUMMARY_INSTRUCTION};
use crate::errors::LlmError;

/// Outcome of one scripted `complete` call.
#[derive(Debug, Clone)]
pub(crate) struct Reply {
    pub text: Result<String, String>,
    pub delay: Duration,
}

impl Reply {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: Ok(text.into()),
            delay: Duration::ZERO,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            text: Err(message.into()),
            delay: Duration::ZERO,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Behaviour of the editor's streaming call.
#[derive(Debug, Clone)]
pub(crate) enum EditorScript {
    Fragments(Vec<String>),
    FailOnOpen(String),
    FailAfter(Vec<String>, String),
}

/// What a scripted call is for, recovered from its system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallKind {
    Specialist(Role),
    Summary,
    Other,
}

impl CallKind {
    pub fn of(request: &ChatRequest) -> Self {
        let system = request.system_prompt().unwrap_or_default();
        if system == SUMMARY_INSTRUCTION {
            return Self::Summary;
        }
        Role::ALL
            .into_iter()
            .find(|role| role.instruction() == system)
            .map_or(Self::Other, Self::Specialist)
    }
}

type CompleteFn = dyn Fn(CallKind, &ChatRequest) -> Reply + Send + Sync;

pub(crate) struct ScriptedClient {
    on_complete: Box<CompleteFn>,
    editor: EditorScript,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    pub fn new(
        on_complete: impl Fn(CallKind, &ChatRequest) -> Reply + Send + Sync + 'static,
        editor: EditorScript,
    ) -> Self {
        Self {
            on_complete: Box::new(on_complete),
            editor,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every specialist and summary succeeds; the editor streams `fragments`.
    pub fn happy(fragments: &[&str]) -> Self {
        Self::new(
            |kind, _| default_reply(kind),
            EditorScript::Fragments(fragments.iter().map(|f| f.to_string()).collect()),
        )
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: &ChatRequest) {
        self.requests.lock().unwrap().push(request.clone());
    }
}

/// Canned reply used by [`ScriptedClient::happy`].
pub(crate) fn default_reply(kind: CallKind) -> Reply {
    match kind {
        CallKind::Specialist(role) => Reply::ok(section_text(role)),
        CallKind::Summary => Reply::ok("  A one-line summary.  "),
        CallKind::Other => Reply::fail("unexpected request"),
    }
}

/// Section text the happy-path script returns for `role`.
pub(crate) fn section_text(role: Role) -> String {
    format!("{} findings for the board.", role.display_name())
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
        self.record(&request);
        let reply = (self.on_complete)(CallKind::of(&request), &request);
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.text.map_err(|message| LlmError::Api {
            status: 500,
            message,
        })
    }

    async fn stream(&self, request: ChatRequest) -> Result<TokenStream, LlmError> {
        self.record(&request);
        let (fragments, failure) = match &self.editor {
            EditorScript::FailOnOpen(message) => {
                return Err(LlmError::Api {
                    status: 503,
                    message: message.clone(),
                });
            }
            EditorScript::Fragments(fragments) => (fragments.clone(), None),
            EditorScript::FailAfter(fragments, message) => {
                (fragments.clone(), Some(message.clone()))
            }
        };

        let items = fragments
            .into_iter()
            .map(Ok)
            .chain(failure.map(|message| Err(LlmError::Stream(message))));
        Ok(futures::stream::iter(items).boxed())
    }
}
