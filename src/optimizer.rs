//! # Optimizer
//! Rewrites one prompt along [GUIDELINES](crate::guidelines::GUIDELINES).
//!
//! One call of [Optimizer::try_optimize]:
//!
//! 1. validates the prompt, failing fast without touching the model;
//! 2. fills the prompt into the meta-prompt, whose guidelines and format instructions were bound at construction;
//! 3. sends the meta-prompt to the model and parses the reply, asking the model once to repair a malformed reply;
//! 4. repeats step 2 and 3 up to [MAX_ATTEMPTS] times on any error.
//!
//! [Optimizer::optimize] collapses the outcome into an [OptimizationResult] safe to show to end users.

use std::sync::Arc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ValidationError;
use crate::filler::Fill;
use crate::guidelines::Guidelines;
use crate::output_parser::{ParseError, ResponseSchema, StructuredOutputParser};
use crate::prompt::{PartialPrompt, PromptTemplate};
use crate::utils::llm::{CompleteText, LlmError};
use crate::utils::token::count_words;

/// Token budget of a prompt to optimize.
pub const MAX_PROMPT_TOKENS: usize = 2500;
/// Word ceiling of a prompt, from [MAX_PROMPT_TOKENS] at 4/3 words per token.
pub const MAX_PROMPT_WORDS: usize = MAX_PROMPT_TOKENS * 4 / 3;
/// Tries per request, each one assembling, calling and parsing anew.
pub const MAX_ATTEMPTS: usize = 3;

pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again later.";
pub const NO_REQUIRED_INFO: &str = "No additional information was required.";

const PROMPT_PLACEHOLDER: &str = "prompt_to_optimize";

const META_PROMPT_TEMPLATE_STR: &str = r#"
### INSTRUCTIONS ###
Given the following guidelines, please optimize the provided query for an LLM.
## NOTE ##
Your task is not to respond to the query to optimize, but to refine it based on the given guidelines.
{{format_instructions}}

### INPUTS ###

## GUIDELINES ##
```plaintext
{{guidelines}}
```

## QUERY TO OPTIMIZE ##
```plaintext
{{prompt_to_optimize}}
```

"#;

/// The fields the model returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizedPrompt {
    pub optimized_prompt: String,
    pub required_info: String,
}

/// What callers get back from [Optimizer::optimize]. Serializes as `{"status": "success", ...}` or
/// `{"status": "error", "message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OptimizationResult {
    Success {
        optimized_prompt: String,
        required_info: String,
    },
    Error {
        message: String,
    },
}

impl OptimizationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, OptimizationResult::Success { .. })
    }
}

impl From<OptimizedPrompt> for OptimizationResult {
    fn from(optimized: OptimizedPrompt) -> Self {
        OptimizationResult::Success {
            optimized_prompt: optimized.optimized_prompt,
            required_info: optimized.required_info,
        }
    }
}

impl From<OptimizeError> for OptimizationResult {
    fn from(err: OptimizeError) -> Self {
        OptimizationResult::Error {
            message: err.user_message(),
        }
    }
}

/// Everything that can go wrong while optimizing.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("remote model failed: {0}")]
    Remote(#[from] LlmError),

    #[error("reply could not be parsed even after repair: {0}")]
    Parse(#[from] ParseError),

    /// A broken invariant of the pipeline itself.
    #[error("internal error: {0}")]
    Internal(String),

    #[error("all {attempts} attempts failed, last error: {last}")]
    AttemptsExhausted {
        attempts: usize,
        last: Box<OptimizeError>,
    },
}

impl OptimizeError {
    /// The message end users see. Only validation errors are specific; everything else stays opaque.
    pub fn user_message(&self) -> String {
        match self {
            OptimizeError::Validation(e) => e.to_string(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

/// Check a prompt before any network call.
pub fn validate_prompt(prompt: &str) -> Result<(), ValidationError> {
    // whitespace-only input has no words to optimize and is rejected as empty
    if prompt.trim().is_empty() {
        return Err(ValidationError::EmptyPrompt);
    }
    let words = count_words(prompt);
    if words > MAX_PROMPT_WORDS {
        return Err(ValidationError::PromptTooLong { words, max_words: MAX_PROMPT_WORDS });
    }
    Ok(())
}

/// Schemas of the two fields the model is asked for.
pub fn response_schemas() -> Vec<ResponseSchema> {
    vec![
        ResponseSchema::new(
            "optimized_prompt",
            "This is the optimized prompt that was generated by following the guidelines.",
        ),
        ResponseSchema::new(
            "required_info",
            format!("This is the additional information that was required to optimize the prompt. \
            If no additional information was required, respond by saying '{}'.", NO_REQUIRED_INFO),
        ),
    ]
}

/// Optimizes prompts with one model. Holds no mutable state, so one instance can serve concurrent calls.
#[derive(Clone)]
pub struct Optimizer {
    llm: Arc<dyn CompleteText>,
    parser: StructuredOutputParser,
    meta_prompt: PartialPrompt,
}

impl Optimizer {
    pub fn new(llm: Arc<dyn CompleteText>) -> Result<Self, OptimizeError> {
        let internal = |e: anyhow::Error| OptimizeError::Internal(format!("{:#}", e));
        let parser = StructuredOutputParser::new(response_schemas()).map_err(internal)?;
        let mut meta_prompt = PromptTemplate::new(META_PROMPT_TEMPLATE_STR).construct_prompt();
        parser.fill_checked(&mut meta_prompt).map_err(internal)?;
        Guidelines.fill_checked(&mut meta_prompt).map_err(internal)?;
        Ok(Self {
            llm,
            parser,
            meta_prompt,
        })
    }

    /// The meta-prompt sent for `prompt`.
    pub fn assemble(&self, prompt: &str) -> Result<String, OptimizeError> {
        let mut meta_prompt = self.meta_prompt.clone();
        meta_prompt
            .try_fill(PROMPT_PLACEHOLDER, prompt)
            .map_err(|e| OptimizeError::Internal(e.to_string()))?;
        meta_prompt.complete().map_err(|e| OptimizeError::Internal(e.to_string()))
    }

    /// Optimize `prompt`, reporting failures as end-user facing [OptimizationResult::Error]s.
    pub async fn optimize(&self, prompt: &str) -> OptimizationResult {
        match self.try_optimize(prompt).await {
            Ok(optimized) => optimized.into(),
            Err(e) => e.into(),
        }
    }

    /// Optimize `prompt` with typed errors. Validation errors return at once; any other error is retried
    /// until [MAX_ATTEMPTS] is used up and then reported as [OptimizeError::AttemptsExhausted].
    pub async fn try_optimize(&self, prompt: &str) -> Result<OptimizedPrompt, OptimizeError> {
        validate_prompt(prompt)?;
        let mut last_error = None;
        for attempt in 1..=MAX_ATTEMPTS {
            match self.attempt(prompt).await {
                Ok(optimized) => {
                    info!("Optimized prompt with {} on attempt {}/{}", self.llm.model(), attempt, MAX_ATTEMPTS);
                    return Ok(optimized);
                }
                Err(e) => {
                    warn!("Optimization attempt {}/{} failed: {}", attempt, MAX_ATTEMPTS, e);
                    last_error = Some(e);
                }
            }
        }
        let last = last_error.unwrap_or_else(|| OptimizeError::Internal("no attempt was made".to_string()));
        Err(OptimizeError::AttemptsExhausted {
            attempts: MAX_ATTEMPTS,
            last: Box::new(last),
        })
    }

    async fn attempt(&self, prompt: &str) -> Result<OptimizedPrompt, OptimizeError> {
        let meta_prompt = self.assemble(prompt)?;
        let completion = self.complete(&meta_prompt).await?;
        let optimized = match self.parse_reply(&completion) {
            Ok(optimized) => optimized,
            Err(e) => {
                debug!("Reply did not match the schema ({}), asking for a repair", e);
                let repair_prompt = self.parser
                    .repair_prompt(&completion, &e)
                    .map_err(|e| OptimizeError::Internal(format!("{:#}", e)))?;
                let repaired = self.complete(&repair_prompt).await?;
                self.parse_reply(&repaired)?
            }
        };
        Ok(fill_required_info(optimized))
    }

    /// Strict parse; a blank `optimized_prompt` counts as malformed.
    fn parse_reply(&self, completion: &str) -> Result<OptimizedPrompt, ParseError> {
        let optimized = self.parser.parse::<OptimizedPrompt>(completion)?;
        if optimized.optimized_prompt.trim().is_empty() {
            return Err(ParseError::BlankField { key: "optimized_prompt".to_string() });
        }
        Ok(optimized)
    }

    async fn complete(&self, prompt: &str) -> Result<String, OptimizeError> {
        let completion = self.llm.complete(prompt).await?;
        if completion.trim().is_empty() {
            return Err(OptimizeError::Internal("the model returned an empty completion".to_string()));
        }
        Ok(completion)
    }
}

/// Fields pass through as parsed, except that a blank `required_info` becomes [NO_REQUIRED_INFO].
fn fill_required_info(mut optimized: OptimizedPrompt) -> OptimizedPrompt {
    if optimized.required_info.trim().is_empty() {
        optimized.required_info = NO_REQUIRED_INFO.to_string();
    }
    optimized
}
