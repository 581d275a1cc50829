//! # prompt-builder
//!
//! Rewrites a prompt along a fixed set of prompt-engineering guidelines with an LLM, and asks the LLM what else
//! it would need to know to do a better job.
//!
//! ## Usage
//!
//! ```no_run
//! use prompt_builder::session::Session;
//! use prompt_builder::optimizer::OptimizationResult;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut session = Session::default();
//! session.set_credential("sk-...")?;
//! match session.optimize("tell me how rust lifetimes work").await {
//!     OptimizationResult::Success { optimized_prompt, required_info } => {
//!         println!("{optimized_prompt}\n\n{required_info}");
//!     }
//!     OptimizationResult::Error { message } => eprintln!("{message}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Concepts and Design
//!
//! The whole thing is one pipeline: `PromptTemplate -> PartialPrompt -> meta-prompt (a String) -> LLM -> structured reply`.
//!
//! ### Prompt Template and Placeholder
//!
//! A template of prompts, for example
//!
//! ```text
//! You are a friendly and helpful assistant. Today is {{date}}.
//! ```
//!
//! `{{date}}` is a placeholder, a slot to be filled, named `"date"`. The name can be any string without line breaks.
//!
//! ### Partial Prompt
//!
//! A [`PartialPrompt`](crate::prompt::PartialPrompt) comes only from
//! [`PromptTemplate::construct_prompt`](crate::prompt::PromptTemplate::construct_prompt) and records which
//! placeholder is filled by what. The optimizer binds the guidelines and the output format instructions once and
//! fills only the user's prompt per request.
//!
//! ### Filler
//!
//! Anything that implements [`FillPlaceholders`](crate::filler::FillPlaceholders) and [`Fill`](crate::filler::Fill).
//! [`Guidelines`](crate::guidelines::Guidelines) and
//! [`StructuredOutputParser`](crate::output_parser::StructuredOutputParser) are fillers.
//!
//! ### Endpoint or LLM
//!
//! Anything that implements [`CompleteText`](crate::utils::llm::CompleteText). The OpenAI completions API is
//! provided by [`OpenAICompletion`](crate::utils::llm::openai::OpenAICompletion).
//!
//! ### Post-processing
//!
//! The reply is parsed into its fields by the [`StructuredOutputParser`](crate::output_parser::StructuredOutputParser).
//! A malformed reply is sent back to the model once for repair, and the whole exchange is retried up to three
//! times before [`Optimizer::optimize`](crate::optimizer::Optimizer::optimize) gives up with a generic message.
//!
//! ## Attribution
//! * `tiktoken-rs`: In [crate::utils::token::tiktoken], we re-export the `tiktoken-rs` crate.


pub mod prompt;
pub mod filler;
pub mod guidelines;
pub mod output_parser;
pub mod config;
pub mod optimizer;
pub mod session;
pub mod utils;
