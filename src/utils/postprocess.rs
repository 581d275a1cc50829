//! Post-processing of raw LLM replies.

pub mod json;
