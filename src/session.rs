use log::error;

use crate::config::{Configuration, ValidationError};
use crate::optimizer::{OptimizationResult, OptimizeError, OptimizedPrompt, Optimizer};
use crate::utils::llm::openai::CompletionConfig;

/// Caller-facing entry point: set a credential, then optimize prompts.
#[derive(Default)]
pub struct Session {
    config: Configuration,
}

impl Session {
    pub fn new(completion: CompletionConfig) -> Self {
        Self::with_configuration(Configuration::new(completion))
    }

    pub fn with_configuration(config: Configuration) -> Self {
        Self { config }
    }

    pub fn set_credential(&mut self, value: &str) -> Result<(), ValidationError> {
        self.config.set_credential(value)
    }

    pub fn credential(&self) -> Option<&str> {
        self.config.credential()
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    /// See [Optimizer::optimize].
    pub async fn optimize(&self, prompt: &str) -> OptimizationResult {
        match self.try_optimize(prompt).await {
            Ok(optimized) => optimized.into(),
            Err(e) => e.into(),
        }
    }

    /// See [Optimizer::try_optimize]. Fails with [ValidationError::MissingApiKey] before a credential is set.
    pub async fn try_optimize(&self, prompt: &str) -> Result<OptimizedPrompt, OptimizeError> {
        let client = self.config.client().ok_or(ValidationError::MissingApiKey)?;
        let optimizer = Optimizer::new(client).map_err(|e| {
            error!("Could not build the optimizer: {}", e);
            e
        })?;
        optimizer.try_optimize(prompt).await
    }
}
