//! Chat-completion client used by every agent in a generation run.
//!
//! [`LlmClient`] is the seam between the orchestration code and the remote
//! service. The real implementation is [`openai::OpenAiClient`]; tests drive
//! the pipeline through a scripted double instead.
//!
//! Two modes are offered:
//! - [`LlmClient::complete`] waits for the whole reply and returns it as one string.
//! - [`LlmClient::stream`] returns a lazy, finite [`TokenStream`] of text fragments
//!   in the order the service produced them. It cannot be restarted.

pub mod openai;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::errors::LlmError;

pub use openai::{OpenAiClient, OpenAiConfig};
pub use types::{ChatMessage, ChatRequest, MessageRole};

/// Incremental reply from [`LlmClient::stream`].
pub type TokenStream = BoxStream<'static, Result<String, LlmError>>;

/// Abstraction over the chat-completion service.
/// Real implementation: `OpenAiClient`. Test double: `ScriptedClient`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send the request and wait for the complete reply text.
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError>;

    /// Send the request in streaming mode. Errors opening the stream are
    /// returned directly; errors after that arrive as stream items.
    async fn stream(&self, request: ChatRequest) -> Result<TokenStream, LlmError>;
}
