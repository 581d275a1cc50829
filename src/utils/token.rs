//! Token counting traits and utilities

pub mod tiktoken;

/// Trait for counting tokens in a string.
pub trait CountToken {
    fn count_token(&self, string: &str) -> usize;
}

/// Blanket impl of CountToken for Fn(&str) -> usize.
impl<F> CountToken for F where F: Fn(&str) -> usize {
    fn count_token(&self, string: &str) -> usize {
        self(string)
    }
}

/// Count whitespace-delimited words.
///
/// A rough stand-in for tokens when no tokenizer is at hand: English text runs at about 3/4 of a word per token.
#[inline]
pub fn count_words(string: &str) -> usize {
    string.split_whitespace().count()
}
