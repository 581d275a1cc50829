//! Structured output: telling the model which fields to return, and reading them back.
//!
//! The model is asked for a fenced JSON object with one string per [ResponseSchema]. Replies that miss
//! the mark can be sent back once through [StructuredOutputParser::repair_prompt].

use std::fmt::Write;
use anyhow::Result;
use lazy_static::lazy_static;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::filler::{Fill, FillPlaceholders};
use crate::prompt::{PartialPrompt, PromptTemplate};
use crate::utils::postprocess::json::{markdown_to_json, InvalidJSON};
use crate::utils::JsonMap;

const REPAIR_TEMPLATE_STR: &str = r#"Instructions:
--------------
{{instructions}}
--------------
Completion:
--------------
{{completion}}
--------------

Above, the Completion did not satisfy the constraints given in the Instructions.
Error:
--------------
{{error}}
--------------

Please try again. Please only respond with an answer that satisfies the constraints laid out in the Instructions:"#;

lazy_static! {
    static ref REPAIR_TEMPLATE: PromptTemplate = PromptTemplate::new(REPAIR_TEMPLATE_STR);
}

/// One named string field the model must return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSchema {
    pub name: String,
    pub description: String,
}

impl ResponseSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Why a reply could not be read as the expected structure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Could not find a JSON object in the completion: {reason}")]
    InvalidJson { reason: String },

    #[error("Got invalid return object. Expected a JSON object, but got {got}")]
    NotAnObject { got: String },

    #[error("Got invalid return object. Expected key `{key}` to be present, but got {got}")]
    MissingKey { key: String, got: String },

    #[error("Got invalid return object. Expected key `{key}` to be a string, but got {got}")]
    NotAString { key: String, got: String },

    #[error("Got invalid return object. Expected key `{key}` to hold text, but it is blank")]
    BlankField { key: String },

    #[error("Could not convert the parsed fields: {0}")]
    Convert(String),
}

impl From<InvalidJSON> for ParseError {
    fn from(err: InvalidJSON) -> Self {
        ParseError::InvalidJson { reason: err.reason }
    }
}

/// Parses replies into the fields of its schemas.
#[derive(Debug, Clone)]
pub struct StructuredOutputParser {
    schemas: Vec<ResponseSchema>,
    format_instructions: String,
    repair_prompt: PartialPrompt,
}

impl StructuredOutputParser {
    pub const PLACEHOLDER: &'static str = "format_instructions";

    pub fn new(schemas: Vec<ResponseSchema>) -> Result<Self> {
        let format_instructions = render_format_instructions(&schemas);
        let mut repair_prompt = REPAIR_TEMPLATE.construct_prompt();
        repair_prompt.try_fill("instructions", format_instructions.as_str())?;
        Ok(Self {
            schemas,
            format_instructions,
            repair_prompt,
        })
    }

    /// Tells the model how to shape its reply.
    pub fn format_instructions(&self) -> &str {
        &self.format_instructions
    }

    /// Strictly parse `text` into `T`, whose fields are the schema names.
    ///
    /// Every schema field must be present. Strings are taken as they are and an array of strings is joined
    /// line by line; any other value is rejected. Keys outside the schema are dropped.
    pub fn parse<T: DeserializeOwned>(&self, text: &str) -> Result<T, ParseError> {
        let value = markdown_to_json(text)?;
        let object = match &value {
            Value::Object(object) => object,
            other => return Err(ParseError::NotAnObject { got: other.to_string() }),
        };
        let mut fields = JsonMap::new();
        for schema in &self.schemas {
            let field = object.get(&schema.name).ok_or_else(|| ParseError::MissingKey {
                key: schema.name.clone(),
                got: value.to_string(),
            })?;
            let field = as_text(field).ok_or_else(|| ParseError::NotAString {
                key: schema.name.clone(),
                got: field.to_string(),
            })?;
            fields.insert(schema.name.clone(), Value::String(field));
        }
        serde_json::from_value(Value::Object(fields)).map_err(|e| ParseError::Convert(e.to_string()))
    }

    /// Prompt asking the model to rewrite a malformed `completion` so it satisfies the format instructions.
    pub fn repair_prompt(&self, completion: &str, error: &ParseError) -> Result<String> {
        let mut repair_prompt = self.repair_prompt.clone();
        repair_prompt
            .try_fill("completion", completion)?
            .try_fill("error", error.to_string())?;
        Ok(repair_prompt.complete()?)
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str())
            .collect::<Option<Vec<&str>>>()
            .map(|lines| lines.join("\n")),
        _ => None,
    }
}

fn render_format_instructions(schemas: &[ResponseSchema]) -> String {
    let mut instructions = String::from(
        "The output should be a markdown code snippet formatted in the following schema, \
        including the leading and trailing \"```json\" and \"```\":\n\n```json\n{\n",
    );
    for schema in schemas {
        // writing into a String cannot fail
        let _ = writeln!(instructions, "\t\"{}\": string  // {}", schema.name, schema.description);
    }
    instructions.push_str("}\n```");
    instructions
}

impl FillPlaceholders for StructuredOutputParser {
    fn placeholders_to_fill(&self) -> &[&'static str] {
        &[Self::PLACEHOLDER]
    }
}

impl Fill for StructuredOutputParser {
    fn fill(&self, partial_prompt: &mut PartialPrompt) -> Result<()> {
        partial_prompt.try_fill(Self::PLACEHOLDER, self.format_instructions.as_str())?;
        Ok(())
    }
}

#[cfg(test)]
mod test_output_parser {
    use std::collections::HashMap;
    use super::{ParseError, ResponseSchema, StructuredOutputParser};

    fn parser() -> StructuredOutputParser {
        StructuredOutputParser::new(vec![
            ResponseSchema::new("answer", "the answer"),
            ResponseSchema::new("source", "where it comes from"),
        ]).unwrap()
    }

    #[test]
    fn test_format_instructions() {
        let instructions = parser().format_instructions().to_string();
        println!("{}", instructions);
        assert!(instructions.starts_with("The output should be a markdown code snippet"));
        assert!(instructions.contains("\t\"answer\": string  // the answer\n"));
        assert!(instructions.contains("\t\"source\": string  // where it comes from\n"));
        assert!(instructions.ends_with("}\n```"));
    }

    #[test]
    fn test_parse() {
        let reply = "```json\n{\"answer\": \"42\", \"source\": \"the book\", \"extra\": 1}\n```";
        let fields: HashMap<String, String> = parser().parse(reply).unwrap();
        assert_eq!(2, fields.len());
        assert_eq!("42", fields["answer"]);
        assert_eq!("the book", fields["source"]);

        let reply = "{\"answer\": \"42\", \"source\": [\"page 1\", \"page 2\"]}";
        let fields: HashMap<String, String> = parser().parse(reply).unwrap();
        assert_eq!("page 1\npage 2", fields["source"]);
    }

    #[test]
    fn test_parse_errors() {
        let parser = parser();
        let err = parser.parse::<HashMap<String, String>>("I don't know").unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson { .. }));

        let err = parser.parse::<HashMap<String, String>>("{\"answer\": \"42\"}").unwrap_err();
        assert_eq!(ParseError::MissingKey { key: "source".to_string(), got: "{\"answer\":\"42\"}".to_string() }, err);

        let err = parser.parse::<HashMap<String, String>>("{\"answer\": 42, \"source\": \"x\"}").unwrap_err();
        assert!(matches!(err, ParseError::NotAString { ref key, .. } if key == "answer"));
    }

    #[test]
    fn test_repair_prompt() {
        let parser = parser();
        let err = ParseError::MissingKey { key: "source".to_string(), got: "{}".to_string() };
        let prompt = parser.repair_prompt("{}", &err).unwrap();
        println!("{}", prompt);
        assert!(prompt.starts_with("Instructions:\n--------------\nThe output should be"));
        assert!(prompt.contains("Completion:\n--------------\n{}\n--------------"));
        assert!(prompt.contains("Expected key `source` to be present"));
        assert!(prompt.ends_with("satisfies the constraints laid out in the Instructions:"));
    }
}
