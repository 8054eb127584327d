//! Generation output parsing.

use lazy_static::lazy_static;
use regex::Regex;
use rulewright_core::GeneratedRule;
use serde_json::{Map, Value};
use thiserror::Error;

lazy_static! {
    /// Opening code fence with optional language tag (```json)
    static ref OPENING_FENCE: Regex = Regex::new(r"^```[a-zA-Z]*").unwrap();
}

/// Characters of raw output kept in an error message.
const EXCERPT_CHARS: usize = 200;

/// Errors from parsing generation output.
#[derive(Error, Debug)]
pub enum OutputParseError {
    #[error("Generation output is not valid JSON ({source}): {excerpt}")]
    InvalidJson {
        excerpt: String,
        source: serde_json::Error,
    },

    #[error("Generation output must be a JSON object, got {found}")]
    NotAnObject { found: &'static str },

    #[error("Generation output field '{field}' is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Remove a surrounding Markdown code fence, if any.
///
/// Content that does not start with a fence is only trimmed.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    let without_open = match OPENING_FENCE.find(trimmed) {
        Some(m) => &trimmed[m.end()..],
        None => trimmed,
    };
    without_open.trim_matches(|c| c == '`' || c == '\n' || c == ' ')
}

/// Parse raw model output into a [`GeneratedRule`].
///
/// A missing `json_logic` becomes `null`. `explanation` defaults to empty,
/// and `used_keys` (or `used_fields`) to an empty list.
pub fn parse_generated_rule(content: &str) -> Result<GeneratedRule, OutputParseError> {
    let body = strip_code_fence(content);

    let value: Value = serde_json::from_str(body).map_err(|source| OutputParseError::InvalidJson {
        excerpt: body.chars().take(EXCERPT_CHARS).collect(),
        source,
    })?;

    let mut object = match value {
        Value::Object(object) => object,
        other => {
            return Err(OutputParseError::NotAnObject {
                found: kind(&other),
            })
        }
    };

    let logic = object.remove("json_logic").unwrap_or(Value::Null);
    let explanation = take_explanation(&mut object)?;
    let used_fields = take_used_fields(&mut object)?;

    Ok(GeneratedRule {
        logic,
        explanation,
        used_fields,
    })
}

fn take_explanation(object: &mut Map<String, Value>) -> Result<String, OutputParseError> {
    match object.remove("explanation") {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(OutputParseError::InvalidField {
            field: "explanation",
            reason: format!("expected a string, got {}", kind(&other)),
        }),
    }
}

fn take_used_fields(object: &mut Map<String, Value>) -> Result<Vec<String>, OutputParseError> {
    let raw = object
        .remove("used_keys")
        .or_else(|| object.remove("used_fields"));

    let items = match raw {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(OutputParseError::InvalidField {
                field: "used_keys",
                reason: format!("expected an array, got {}", kind(&other)),
            })
        }
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            other => Err(OutputParseError::InvalidField {
                field: "used_keys",
                reason: format!("expected strings, got {}", kind(&other)),
            }),
        })
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
