use std::collections::HashMap;
use anyhow::{anyhow, Result};
pub use tiktoken_rs::{get_bpe_from_model, CoreBPE};

use crate::utils::token::CountToken;
use lazy_static::lazy_static;

lazy_static! {
    /// const map from completion model name to its context window, prompt and output together.
    pub static ref MODEL_TO_MAX_TOKENS: HashMap<&'static str, usize> = HashMap::from([
        ("gpt-3.5-turbo-instruct", 4096),
        ("gpt-3.5-turbo-instruct-0914", 4096),
        ("gpt-4", 8192),
        ("gpt-4-32k", 32768),
        ("gpt-3.5-turbo", 4096),
        ("gpt-3.5-turbo-16k", 16384),
    ]);
}

/// Counter using the Tiktoken tokenizer.
#[derive(Clone)]
#[readonly::make]
pub struct Tiktoken {
    /// The model name. read-only.
    #[readonly]
    pub model: String,
    /// The context window of the model. read-only.
    #[readonly]
    pub max_tokens: usize,
    /// The tokenizer. read-only.
    #[readonly]
    pub bpe: CoreBPE,
}

impl Tiktoken {
    /// Create a new Tiktoken counter. Fails for models missing from [MODEL_TO_MAX_TOKENS].
    pub fn new(model: impl Into<String>) -> Result<Self> {
        let model = model.into();
        let max_tokens = *MODEL_TO_MAX_TOKENS
            .get(model.as_str())
            .ok_or_else(|| anyhow!("model {} is not supported", model))?;
        // every model in the table shares the cl100k encoding of its family
        let encoding_model = if model.starts_with("gpt-4") {
            "gpt-4"
        } else {
            "gpt-3.5-turbo"
        };
        let bpe = get_bpe_from_model(encoding_model)?;
        Ok(Tiktoken {
            model,
            max_tokens,
            bpe,
        })
    }

    /// Tokens left for the reply after a prompt of `prompt_tokens`, or `None` if the prompt alone overflows.
    pub fn remaining_tokens(&self, prompt_tokens: usize) -> Option<usize> {
        self.max_tokens.checked_sub(prompt_tokens)
    }

    /// Whether a prompt plus a reply of up to `max_output_tokens` fits into the context window.
    pub fn fits_context(&self, prompt: &str, max_output_tokens: usize) -> bool {
        self.remaining_tokens(self.count_token(prompt))
            .map_or(false, |left| left >= max_output_tokens)
    }
}

impl CountToken for Tiktoken {
    fn count_token(&self, string: &str) -> usize {
        self.bpe.encode_with_special_tokens(string).len()
    }
}
