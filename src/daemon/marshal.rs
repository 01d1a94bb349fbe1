//! String-list marshaling for `Variants` replies.
//!
//! The list travels as a plain JSON array. An empty lookup is `[]`, never
//! `null`, so callers can tell "nothing registered" from a failed call.
//!
//! CHANGELOG:
//! - 10/19/2026 - Initial implementation

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MarshalError {
    #[error("expected a list of strings, got {0}")]
    NotAList(String),

    #[error("list element {index} is not a string")]
    NotAString { index: usize },
}

/// Encode paths in the order given. No sorting, dedup, or filtering.
pub fn encode_list(paths: Vec<String>) -> Value {
    Value::Array(paths.into_iter().map(Value::String).collect())
}

/// Decode a wire list back into owned strings.
pub fn decode_list(value: &Value) -> Result<Vec<String>, MarshalError> {
    let items = match value {
        Value::Array(items) => items,
        other => return Err(MarshalError::NotAList(type_name(other).to_string())),
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_str()
                .map(str::to_string)
                .ok_or(MarshalError::NotAString { index })
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
