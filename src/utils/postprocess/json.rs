use serde_json::{from_str, Value};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref FENCED_JSON_RE: Regex = Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").unwrap();
}

/// Filters invalid content and tries to parse the valid json string.
///
/// Everything outside the outermost pair of braces is dropped before parsing.
///
/// Returns a [serde_json::Value] if the string is valid json else an [InvalidJSON] error.
///
/// # Example
/// ```
/// use prompt_builder::utils::postprocess::json::filter_to_json;
/// let valid_str = "partially valid: {\"a\":\"alice\"}";
/// let json_value = filter_to_json(valid_str).expect("Expect to be fine but failed");
/// assert_eq!(json_value["a"], "alice");
///
/// let invalid_str = "partially valid: \"a\":\"alice\"}";
/// assert_eq!(filter_to_json(invalid_str).is_err(), true)
/// ```
pub fn filter_to_json(string: &str) -> Result<Value, InvalidJSON> {
    let left_brace_idx = string.find('{');
    let right_brace_idx = string.rfind('}');
    match (left_brace_idx, right_brace_idx) {
        (Some(lbi), Some(rbi)) if lbi < rbi => {
            from_str(&string[lbi..=rbi]).map_err(|e| InvalidJSON {
                invalid_string: string.to_string(),
                reason: e.to_string(),
            })
        }
        _ => Err(InvalidJSON {
            invalid_string: string.to_string(),
            reason: "no JSON object found".to_string(),
        })
    }
}

/// Parses the JSON object of a markdown reply.
///
/// Fenced code blocks are tried first, in order, so prose braces around the block do not get in the way.
/// Falls back to [filter_to_json] on the whole string.
pub fn markdown_to_json(string: &str) -> Result<Value, InvalidJSON> {
    FENCED_JSON_RE
        .captures_iter(string)
        .find_map(|captures| filter_to_json(&captures[1]).ok())
        .map_or_else(|| filter_to_json(string), Ok)
}

/// Error when the string is not a valid json.
#[derive(Debug, Clone, Error)]
#[error("Invalid string to be parsed ({reason}):\n{invalid_string}")]
pub struct InvalidJSON {
    pub invalid_string: String,
    pub reason: String,
}


#[cfg(test)]
mod test_json {
    use super::{filter_to_json, markdown_to_json};

    #[test]
    fn test_filter_to_json() {
        let valid_str = "{\"a\":\"alice\"}";
        let json_value = filter_to_json(valid_str).expect("Expect to be fine but failed");
        println!("{:?}", json_value);

        let valid_str = "Here is the result you ask for: {\"a\":\"alice\"}";
        let json_value = filter_to_json(valid_str).expect("Expect to be fine but failed");
        assert_eq!(json_value["a"], "alice");

        let invalid_str = "Here is the result you ask for: {\"a\":\"alice\"";
        let json_error = filter_to_json(invalid_str).expect_err("This should give error but not");
        println!("{:?}", json_error);

        let invalid_str = "{{}}";
        let json_error = filter_to_json(invalid_str).expect_err("This should give error but not");
        println!("{}", json_error);

        let invalid_str = "} backwards {";
        assert!(filter_to_json(invalid_str).is_err());
    }

    #[test]
    fn test_markdown_to_json() {
        let reply = "Sure {here it is}:\n```json\n{\n\t\"a\": \"alice\"\n}\n```\nAnything {else}?";
        let json_value = markdown_to_json(reply).expect("Expect to be fine but failed");
        assert_eq!(json_value["a"], "alice");

        let reply = "```\n{\"b\": \"bob\"}\n```";
        assert_eq!(markdown_to_json(reply).unwrap()["b"], "bob");

        let reply = "no fence: {\"c\": \"carol\"}";
        assert_eq!(markdown_to_json(reply).unwrap()["c"], "carol");

        let reply = "```json\nnot json\n```";
        assert!(markdown_to_json(reply).is_err());
    }
}
