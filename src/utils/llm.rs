//! The remote model boundary.
//!
//! Everything downstream only needs `complete(prompt) -> text`, so the provider sits behind [CompleteText]
//! and tests can swap in a scripted model.

pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a remote completion.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The request never got a response: connection, timeout, TLS.
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered with an error, e.g. bad credential or rate limit.
    #[error("provider error: {0}")]
    Api(String),

    #[error("the model returned no text")]
    EmptyCompletion,

    /// The request could not be built on our side.
    #[error("invalid request: {0}")]
    Request(String),
}

impl LlmError {
    /// Whether resending the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, LlmError::Network(_))
    }
}

/// A text-in, text-out model.
#[async_trait]
pub trait CompleteText: Send + Sync {
    /// Send `prompt` and return the raw reply.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Model name for logs.
    fn model(&self) -> &str;
}
