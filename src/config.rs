//! Credential and remote client, held together.
//!
//! A [Configuration] is filled once by the caller and then only read; requests clone the client handle
//! out of it, so re-setting the credential never disturbs a request in flight.

use std::fmt;
use std::sync::Arc;
use log::info;
use thiserror::Error;

use crate::utils::llm::CompleteText;
use crate::utils::llm::openai::{CompletionConfig, OpenAICompletion};

/// Malformed or out-of-bound caller input. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("The API key cannot be an empty string.")]
    EmptyApiKey,

    #[error("The API key has not been set.")]
    MissingApiKey,

    #[error("The prompt cannot be an empty string.")]
    EmptyPrompt,

    #[error("The prompt cannot exceed {max_words} words.")]
    PromptTooLong { words: usize, max_words: usize },
}

/// A non-empty API key without surrounding whitespace.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: &str) -> Result<Self, ValidationError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ValidationError::EmptyApiKey);
        }
        Ok(Self(value.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Holds the credential and the client bound to it.
#[derive(Default)]
pub struct Configuration {
    api_key: Option<ApiKey>,
    client: Option<Arc<dyn CompleteText>>,
    completion: CompletionConfig,
}

impl Configuration {
    /// Empty configuration whose clients will use `completion`.
    pub fn new(completion: CompletionConfig) -> Self {
        Self {
            api_key: None,
            client: None,
            completion,
        }
    }

    /// Configuration around an already built client, with no credential of its own.
    pub fn with_client(client: Arc<dyn CompleteText>) -> Self {
        Self {
            api_key: None,
            client: Some(client),
            completion: CompletionConfig::default(),
        }
    }

    /// Validate and store the credential, then bind a fresh OpenAI client to it.
    ///
    /// On failure the previous credential and client are kept.
    pub fn set_credential(&mut self, value: &str) -> Result<(), ValidationError> {
        let api_key = ApiKey::new(value)?;
        let client = OpenAICompletion::new(&api_key, self.completion.clone());
        info!("Credential set, bound client for {}", self.completion.model);
        self.api_key = Some(api_key);
        self.client = Some(Arc::new(client));
        Ok(())
    }

    /// The stored credential, if any.
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_ref().map(ApiKey::expose)
    }

    /// A handle to the bound client, if any.
    pub fn client(&self) -> Option<Arc<dyn CompleteText>> {
        self.client.clone()
    }

    pub fn completion(&self) -> &CompletionConfig {
        &self.completion
    }
}
