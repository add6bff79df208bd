//! OpenAI-compatible chat-completion client.
//!
//! Speaks `POST {base_url}/chat/completions` with bearer authentication.
//! Streaming replies arrive as `data: {json}` lines terminated by
//! `data: [DONE]`; [`ChunkDecoder`] turns the raw byte stream into text
//! fragments.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use super::types::{ChatMessage, ChatRequest};
use super::{LlmClient, TokenStream};
use crate::errors::LlmError;

/// Default OpenAI API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default environment variable holding the API key.
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Connection settings for [`OpenAiClient`].
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    /// Name of the variable the key is read from, for error messages.
    pub api_key_env: String,
    pub connect_timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Client for the OpenAI chat-completions API.
///
/// Holds only immutable configuration and a pooled HTTP client, so one
/// instance is shared by every concurrent generation run.
pub struct OpenAiClient {
    config: OpenAiConfig,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(LlmError::Transport)?;
        Ok(Self { config, http })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn api_key(&self) -> Result<&str, LlmError> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| LlmError::MissingApiKey {
                env_var: self.config.api_key_env.clone(),
            })
    }

    async fn send(&self, request: &ChatRequest, stream: bool) -> Result<reqwest::Response, LlmError> {
        let api_key = self.api_key()?;
        let body = CompletionBody {
            model: &self.config.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream,
        };

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(LlmError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(parse_api_error(status.as_u16(), &body_text));
        }
        Ok(response)
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
        let response = self.send(&request, false).await?;
        let body_text = response.text().await.map_err(LlmError::Transport)?;
        let completion: ChatCompletion =
            serde_json::from_str(&body_text).map_err(|e| LlmError::Decode(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or(LlmError::EmptyResponse)
    }

    async fn stream(&self, request: ChatRequest) -> Result<TokenStream, LlmError> {
        let response = self.send(&request, true).await?;
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();
        Ok(token_stream(body))
    }
}

// ── Wire types ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    message: Option<AssistantMessage>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

/// Map a non-success HTTP reply to an error, preferring the provider's
/// own `{"error": {"message": ...}}` text over the raw body.
fn parse_api_error(status: u16, body: &str) -> LlmError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .ok()
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no response body".to_string()
            } else {
                trimmed.to_string()
            }
        });
    LlmError::Api { status, message }
}

// ── Streaming ─────────────────────────────────────────────────────────

/// Incremental decoder for the `data:` lines of a streaming reply.
///
/// Bytes are buffered until a full line is available so multi-byte
/// characters split across network chunks decode intact.
#[derive(Debug, Default)]
pub(crate) struct ChunkDecoder {
    buffer: Vec<u8>,
    finished: bool,
}

impl ChunkDecoder {
    /// Feed raw bytes, returning every fragment completed by them.
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, LlmError> {
        self.buffer.extend_from_slice(bytes);
        let mut fragments = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(fragment) = self.decode_line(&String::from_utf8_lossy(&line))? {
                fragments.push(fragment);
            }
        }
        Ok(fragments)
    }

    /// Flush a trailing line that arrived without a newline.
    pub(crate) fn finish(&mut self) -> Result<Option<String>, LlmError> {
        let rest = std::mem::take(&mut self.buffer);
        self.decode_line(&String::from_utf8_lossy(&rest))
    }

    /// True once `data: [DONE]` has been seen.
    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    fn decode_line(&mut self, line: &str) -> Result<Option<String>, LlmError> {
        if self.finished {
            return Ok(None);
        }
        let Some(payload) = line.trim().strip_prefix("data:") else {
            return Ok(None);
        };
        let payload = payload.trim();
        if payload.is_empty() {
            return Ok(None);
        }
        if payload == "[DONE]" {
            self.finished = true;
            return Ok(None);
        }

        let chunk: ChatChunk =
            serde_json::from_str(payload).map_err(|e| LlmError::Decode(e.to_string()))?;
        if let Some(error) = chunk.error {
            return Err(LlmError::Stream(error.message));
        }
        Ok(chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta)
            .and_then(|delta| delta.content)
            .filter(|content| !content.is_empty()))
    }
}

struct StreamState {
    body: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    decoder: ChunkDecoder,
    pending: VecDeque<String>,
    done: bool,
}

/// Adapt a raw response body into a stream of text fragments.
///
/// The body is only polled when the consumer asks for the next fragment,
/// and the stream ends after the first error.
fn token_stream(body: BoxStream<'static, reqwest::Result<Vec<u8>>>) -> TokenStream {
    let state = StreamState {
        body,
        decoder: ChunkDecoder::default(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(fragment) = state.pending.pop_front() {
                return Some((Ok(fragment), state));
            }
            if state.done {
                return None;
            }
            match state.body.next().await {
                Some(Ok(bytes)) => match state.decoder.push(&bytes) {
                    Ok(fragments) => {
                        state.pending.extend(fragments);
                        state.done = state.decoder.is_finished();
                    }
                    Err(err) => {
                        state.done = true;
                        return Some((Err(err), state));
                    }
                },
                Some(Err(err)) => {
                    state.done = true;
                    return Some((Err(LlmError::Transport(err)), state));
                }
                None => {
                    state.done = true;
                    match state.decoder.finish() {
                        Ok(fragment) => state.pending.extend(fragment),
                        Err(err) => return Some((Err(err), state)),
                    }
                }
            }
        }
    })
    .boxed()
}
