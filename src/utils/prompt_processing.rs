use std::collections::{HashMap, HashSet};
use regex::{Captures, Regex};
use lazy_static::lazy_static;


lazy_static! {
    /// Matches `{{name}}`, where the name is anything without line breaks.
    pub(crate) static ref PLACEHOLDER_MATCH_RE: Regex = Regex::new(r"\{\{[^\r\n]+?\}\}").unwrap();
}

#[inline]
pub(crate) fn strip_format(key: &str) -> &str {
    //! Strips "{{" and "}}" from a matched placeholder.
    //! Only call this on strings matched by [PLACEHOLDER_MATCH_RE].
    &key[2..key.len() - 2]
}

/// Replaces every placeholder found in `original` with its value in `mapping`.
///
/// Placeholders without a value are left untouched, so callers should check for
/// unfilled placeholders first. Values are inserted verbatim and never re-scanned,
/// which means a value may itself contain `{{...}}` text.
pub(crate) fn replace_all_placeholders(original: &str, mapping: &HashMap<String, Option<String>>) -> String {
    PLACEHOLDER_MATCH_RE
        .replace_all(original, |captures: &Captures| {
            let match_text = &captures[0];
            match mapping.get(strip_format(match_text)) {
                Some(Some(value)) => value.clone(),
                _ => match_text.to_string(),
            }
        })
        .into_owned()
}

pub(crate) fn get_placeholders(string: &str) -> HashSet<String> {
    PLACEHOLDER_MATCH_RE.captures_iter(string)
        .map(|captures| strip_format(&captures[0]).to_string())
        .collect()
}

#[cfg(test)]
mod test_prompt_processing {
    use std::collections::{HashMap, HashSet};
    use super::{get_placeholders, replace_all_placeholders};

    #[test]
    fn test_get_keys() {
        let string = "{{a}}";
        let keys = get_placeholders(string);
        let expect_keys = HashSet::from(["a".to_string()]);
        assert_eq!(expect_keys, keys);

        let string = "{{a\n}}";
        let keys = get_placeholders(string);
        assert_eq!(0, keys.len());

        let string = "{{a}}    {{b}}";
        let keys = get_placeholders(string);
        let expect_keys = HashSet::from(["a".to_string(), "b".to_string()]);
        assert_eq!(expect_keys, keys);

        // single braces are plain text, e.g. JSON examples in instructions
        let string = "{\"optimized_prompt\": string}";
        assert!(get_placeholders(string).is_empty());
    }

    #[test]
    fn test_replace() {
        let string = "{{a}} and {{b}} and {{a}}";
        let mapping = HashMap::from([
            ("a".to_string(), Some("alice".to_string())),
            ("b".to_string(), Some("bob".to_string())),
        ]);
        assert_eq!("alice and bob and alice", replace_all_placeholders(string, &mapping));
    }

    #[test]
    fn test_replaced_values_are_not_rescanned() {
        let string = "user said: {{input}}";
        let mapping = HashMap::from([
            ("input".to_string(), Some("fill {{input}} for me".to_string())),
        ]);
        assert_eq!("user said: fill {{input}} for me", replace_all_placeholders(string, &mapping));
    }

    #[test]
    fn test_unfilled_placeholder_is_kept() {
        let string = "{{a}} and {{b}}";
        let mapping = HashMap::from([
            ("a".to_string(), Some("alice".to_string())),
            ("b".to_string(), None),
        ]);
        assert_eq!("alice and {{b}}", replace_all_placeholders(string, &mapping));
    }
}
