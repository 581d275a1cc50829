use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::CreateCompletionRequestArgs;
use async_openai::Client;
use async_trait::async_trait;
use log::{debug, warn};

use crate::config::ApiKey;
use crate::utils::llm::{CompleteText, LlmError};
use crate::utils::token::tiktoken::Tiktoken;
use crate::utils::token::CountToken;

/// Fixed parameters of every completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConfig {
    pub model: String,
    pub temperature: f32,
    /// Upper bound of generated tokens per reply.
    pub max_tokens: u16,
    /// How many times a request is sent before a network error is given up on.
    pub max_retries: u32,
    /// Overrides the OpenAI endpoint, e.g. for a compatible proxy.
    pub api_base: Option<String>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo-instruct".to_string(),
            temperature: 0.7,
            max_tokens: 1500,
            max_retries: 3,
            api_base: None,
        }
    }
}

/// Completion model served by the OpenAI API.
///
/// Building one does not touch the network; a bad key only shows up on the first [CompleteText::complete].
#[derive(Clone)]
pub struct OpenAICompletion {
    client: Client<OpenAIConfig>,
    config: CompletionConfig,
    tokenizer: Option<Tiktoken>,
}

impl OpenAICompletion {
    pub fn new(api_key: &ApiKey, config: CompletionConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(api_key.expose());
        if let Some(api_base) = &config.api_base {
            openai_config = openai_config.with_api_base(api_base);
        }
        let tokenizer = match Tiktoken::new(config.model.as_str()) {
            Ok(tokenizer) => Some(tokenizer),
            Err(e) => {
                debug!("No tokenizer for {}, skipping context checks: {}", config.model, e);
                None
            }
        };
        Self {
            client: Client::with_config(openai_config),
            config,
            tokenizer,
        }
    }

    fn check_context(&self, prompt: &str) {
        if let Some(tokenizer) = &self.tokenizer {
            let prompt_tokens = tokenizer.count_token(prompt);
            debug!("Prompt for {} has {} tokens", self.config.model, prompt_tokens);
            if !tokenizer.fits_context(prompt, self.config.max_tokens as usize) {
                warn!("Prompt of {} tokens plus {} reply tokens exceeds the {} token window of {}",
                    prompt_tokens, self.config.max_tokens, tokenizer.max_tokens, self.config.model);
            }
        }
    }

    async fn request(&self, prompt: &str) -> Result<String, LlmError> {
        let request = CreateCompletionRequestArgs::default()
            .model(self.config.model.as_str())
            .prompt(prompt)
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens)
            .build()
            .map_err(|e| LlmError::Request(e.to_string()))?;
        let response = self.client.completions().create(request).await.map_err(to_llm_error)?;
        let text = response.choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or(LlmError::EmptyCompletion)?;
        if text.trim().is_empty() {
            return Err(LlmError::EmptyCompletion);
        }
        Ok(text)
    }
}

fn to_llm_error(err: OpenAIError) -> LlmError {
    match &err {
        OpenAIError::Reqwest(_) => LlmError::Network(err.to_string()),
        OpenAIError::InvalidArgument(_) => LlmError::Request(err.to_string()),
        _ => LlmError::Api(err.to_string()),
    }
}

#[async_trait]
impl CompleteText for OpenAICompletion {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.check_context(prompt);
        let tries = self.config.max_retries.max(1);
        let mut try_idx = 1;
        loop {
            match self.request(prompt).await {
                Err(e) if e.is_transient() && try_idx < tries => {
                    warn!("{} request {}/{} failed, resending: {}", self.config.model, try_idx, tries, e);
                    try_idx += 1;
                }
                result => return result,
            }
        }
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
