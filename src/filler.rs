//! # Filler
//! Anything that fills one or more placeholders in a [PartialPrompt].
//!
//! Fixed content such as guidelines or output format instructions is bound through fillers once, when a
//! pipeline is built, leaving only the per-request slots open.

use crate::prompt::PartialPrompt;
use anyhow::{ensure, Result};

/// Names the placeholders a filler is responsible for.
pub trait FillPlaceholders {
    fn placeholders_to_fill(&self) -> &[&'static str];
}

/// Fills its placeholders from its own state.
pub trait Fill: FillPlaceholders {
    fn fill(&self, partial_prompt: &mut PartialPrompt) -> Result<()>;

    /// Fill, then check that every placeholder this filler claims is actually filled.
    fn fill_checked(&self, partial_prompt: &mut PartialPrompt) -> Result<()> {
        self.fill(partial_prompt)?;
        let unfilled = partial_prompt.unfilled_placeholders();
        for placeholder in self.placeholders_to_fill() {
            ensure!(!unfilled.contains(placeholder), "filler left placeholder {} unfilled", placeholder);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test_filler {
    use super::{Fill, FillPlaceholders};
    use crate::prompt::{PartialPrompt, PromptTemplate};

    struct Today;

    impl FillPlaceholders for Today {
        fn placeholders_to_fill(&self) -> &[&'static str] {
            &["date"]
        }
    }

    impl Fill for Today {
        fn fill(&self, partial_prompt: &mut PartialPrompt) -> anyhow::Result<()> {
            partial_prompt.try_fill("date", "2024-01-01")?;
            Ok(())
        }
    }

    struct Lazy;

    impl FillPlaceholders for Lazy {
        fn placeholders_to_fill(&self) -> &[&'static str] {
            &["date"]
        }
    }

    impl Fill for Lazy {
        fn fill(&self, _partial_prompt: &mut PartialPrompt) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_fill_checked() {
        let template = PromptTemplate::new("Today is {{date}}.");
        let mut partial = template.construct_prompt();
        Today.fill_checked(&mut partial).unwrap();
        assert_eq!("Today is 2024-01-01.", partial.complete().unwrap());

        let mut partial = template.construct_prompt();
        assert!(Lazy.fill_checked(&mut partial).is_err());

        let other = PromptTemplate::new("No date here: {{topic}}");
        let mut partial = other.construct_prompt();
        assert!(Today.fill_checked(&mut partial).is_err());
    }
}
