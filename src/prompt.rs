//! # Prompt
//! A prompt is simply a string
//! ## PromptTemplate
//! A prompt template is a string with placeholders.
//!
//! ## Placeholder
//! A placeholder is a string that is in the format of `{{name}}`. It can be filled with a value.
//! It has a name, which is the string inside the double braces.
//!
//! ## PartialPrompt
//! A partial prompt is a prompt template with some placeholders filled. A partial prompt can be only constructed from a prompt template via [PromptTemplate::construct_prompt].
//!
//! The placeholders in a partial prompt can be filled with values via [PartialPrompt::try_fill] or by a [filler](crate::filler).
//! A partially filled prompt is cheap to clone, so the slots that never change can be bound once and the clone filled per request.
//! When all placeholders are filled, the partial prompt can be completed via [PartialPrompt::complete], in which the placeholders in a template are **actually** replaced with the filling values.
//!
//! ### Counting tokens
//! [PartialPrompt::current_token_num] counts the tokens of the prompt as it currently stands.


use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use crate::prompt::errors::{PlaceholderNotExist, UnfilledPlaceholders};
use crate::utils::prompt_processing::{get_placeholders, replace_all_placeholders};
use crate::utils::token::CountToken;
use log::warn;


/// A prompt template with some placeholders filled. A partial prompt can be only constructed from a prompt template via [PromptTemplate::construct_prompt].
#[derive(Debug, Clone)]
#[readonly::make]
pub struct PartialPrompt {
    /// The template of the partial prompt, readonly
    #[readonly]
    pub template: PromptTemplate,

    /// Mapping from placeholder name to its filling value
    pub(crate) placeholder_to_vals: HashMap<String, Option<String>>,

    /// Record the placeholders that are not filled yet
    pub(crate) unfilled_placeholders: HashSet<String>,
}

impl PartialPrompt {
    /// Fill the placeholder in the partial prompt with the given value, overwriting any previous value.
    /// Returns an error if the placeholder does not exist.
    pub fn try_fill(&mut self, placeholder: impl Into<String>, value: impl Into<String>) -> Result<&mut Self, PlaceholderNotExist> {
        let placeholder = placeholder.into();
        if self.placeholder_to_vals.contains_key(&placeholder) {
            self.unfilled_placeholders.remove(&placeholder);
            self.placeholder_to_vals.insert(placeholder, Some(value.into()));
            Ok(self)
        } else {
            Err(PlaceholderNotExist::new(placeholder, &self.template.placeholders))
        }
    }

    /// Placeholders that still have no value.
    pub fn unfilled_placeholders(&self) -> Vec<&str> {
        let mut unfilled: Vec<&str> = self.unfilled_placeholders.iter().map(String::as_str).collect();
        unfilled.sort_unstable();
        unfilled
    }

    /// Count the number of tokens in the prompt. Unfilled placeholders are counted with the placeholder names.
    pub fn current_token_num(&self, counter: &impl CountToken) -> usize {
        counter.count_token(&replace_all_placeholders(self.template.str(), &self.placeholder_to_vals))
    }

    /// Complete the partial prompt and return the completed prompt.
    /// Returns an error if there are still unfilled placeholders.
    pub fn complete(&self) -> Result<String, UnfilledPlaceholders> {
        if self.unfilled_placeholders.is_empty() {
            Ok(replace_all_placeholders(self.template.str(), &self.placeholder_to_vals))
        } else {
            let mut all_placeholders: Vec<String> = self.template.placeholders.iter().cloned().collect();
            all_placeholders.sort_unstable();
            Err(UnfilledPlaceholders {
                all_placeholders,
                unfilled_placeholders: self.unfilled_placeholders().into_iter().map(String::from).collect(),
            })
        }
    }
}

/// A prompt template with placeholders.
#[derive(Debug, Clone)]
#[readonly::make]
pub struct PromptTemplate {
    /// The template string, immutable
    template: Arc<String>,

    /// The placeholders in the template, readonly
    #[readonly]
    pub placeholders: HashSet<String>,
}

impl PromptTemplate {
    /// Create a prompt template from a string. Warns if the template does not have any placeholder.
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let placeholders = get_placeholders(&template);
        if placeholders.is_empty() {
            warn!("Your prompt template does not have a placeholder. If this is intended, ignore this message. \
            Otherwise, check whether you have written placeholders correctly.\n\
            Got prompt template:\n\
            {}", template);
        }
        Self {
            template: Arc::new(template),
            placeholders,
        }
    }

    /// Get the prompt template as a string.
    #[inline]
    pub fn str(&self) -> &str {
        &self.template
    }

    /// Construct a partial prompt from the prompt template.
    pub fn construct_prompt(&self) -> PartialPrompt {
        PartialPrompt {
            template: self.clone(),
            placeholder_to_vals: self.placeholders.iter().map(|p| (p.clone(), None)).collect(),
            unfilled_placeholders: self.placeholders.clone(),
        }
    }
}

pub mod errors {
    use std::collections::HashSet;
    use thiserror::Error;

    /// Error when trying to complete a partial prompt but there are still unfilled placeholders.
    #[derive(Debug, Error)]
    #[error("UnfilledPlaceholders: to complete the prompt template,\n  Requires Placeholders:{all_placeholders:?}\n  Unfilled Placeholders:{unfilled_placeholders:?}")]
    pub struct UnfilledPlaceholders {
        pub unfilled_placeholders: Vec<String>,
        pub all_placeholders: Vec<String>,
    }

    /// Error when trying to fill a placeholder that does not exist in the prompt template of the partial prompt.
    ///
    /// The filling value is not kept, as it may be a whole user prompt.
    #[derive(Debug, Error)]
    #[error("PlaceholderNotExist: try to fill placeholder = {try_fill_placeholder}, but available placeholders are {available_placeholders:?}")]
    pub struct PlaceholderNotExist {
        pub try_fill_placeholder: String,
        pub available_placeholders: Vec<String>,
    }

    impl PlaceholderNotExist {
        pub(crate) fn new(try_fill_placeholder: impl Into<String>,
                          available_placeholders: &HashSet<String>) -> Self {
            let mut available_placeholders: Vec<String> = available_placeholders.iter().cloned().collect();
            available_placeholders.sort_unstable();
            PlaceholderNotExist {
                try_fill_placeholder: try_fill_placeholder.into(),
                available_placeholders,
            }
        }
    }
}

#[cfg(test)]
mod test_prompt {
    use super::PromptTemplate;
    use crate::utils::token::count_words;

    #[test]
    fn test_partial_fill_then_complete() {
        let template = PromptTemplate::new("Rules: {{rules}}\nQuery: {{query}}");
        let mut partial = template.construct_prompt();
        partial.try_fill("rules", "be concise").unwrap();
        assert_eq!(vec!["query"], partial.unfilled_placeholders());

        let err = partial.complete().expect_err("query is still unfilled");
        assert_eq!(vec!["query".to_string()], err.unfilled_placeholders);
        assert_eq!(vec!["query".to_string(), "rules".to_string()], err.all_placeholders);

        // the bound slot survives cloning, so each request only fills its own slot
        let mut request = partial.clone();
        request.try_fill("query", "what is rust?").unwrap();
        assert_eq!("Rules: be concise\nQuery: what is rust?", request.complete().unwrap());
        assert!(partial.complete().is_err());
    }

    #[test]
    fn test_fill_unknown_placeholder() {
        let template = PromptTemplate::new("{{a}}");
        let mut partial = template.construct_prompt();
        let err = partial.try_fill("b", "bob").expect_err("b is not a placeholder");
        assert_eq!("b", err.try_fill_placeholder);
        assert_eq!(vec!["a".to_string()], err.available_placeholders);
        println!("{}", err);
    }

    #[test]
    fn test_refill_overwrites() {
        let template = PromptTemplate::new("{{a}}");
        let mut partial = template.construct_prompt();
        partial.try_fill("a", "alice").unwrap().try_fill("a", "anna").unwrap();
        assert_eq!("anna", partial.complete().unwrap());
    }

    #[test]
    fn test_current_token_num() {
        let template = PromptTemplate::new("one two {{three}}");
        let mut partial = template.construct_prompt();
        assert_eq!(3, partial.current_token_num(&count_words));
        partial.try_fill("three", "three four five").unwrap();
        assert_eq!(5, partial.current_token_num(&count_words));
    }
}
