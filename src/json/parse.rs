//! Purpose: Decode JSON bytes into the generic `Value` tree.
//! Exports: `decode_json`.
//! Role: Parser boundary; serde_json does the syntax work, this module does the mapping.
//! Invariants: serde_json runs with `arbitrary_precision`, so numbers arrive as exact text.
//! Invariants: Trailing non-whitespace after the document is a syntax error.
//! Notes: Duplicate object keys keep the first position and the last value.
//! Notes: Nesting is capped at serde_json's 128 levels; deeper documents are
//! rejected as `MalformedInput` with a message that names the depth limit.

use crate::core::error::{Error, ErrorKind};
use crate::core::value::{Mapping, Number, Value};

pub fn decode_json(bytes: &[u8]) -> Result<Value, Error> {
    let parsed: serde_json::Value = serde_json::from_slice(bytes).map_err(malformed_json_error)?;
    Ok(from_serde(parsed))
}

// serde_json's built-in recursion limit.
const MAX_DEPTH: usize = 128;

fn malformed_json_error(err: serde_json::Error) -> Error {
    let too_deep = err.to_string().starts_with("recursion limit exceeded");
    let mut out = if too_deep {
        Error::new(ErrorKind::MalformedInput)
            .with_message(format!(
                "json nests deeper than {MAX_DEPTH} levels: {err}"
            ))
            .with_hint(format!(
                "Flatten the document; arrays and objects nest at most {MAX_DEPTH} deep."
            ))
    } else {
        Error::new(ErrorKind::MalformedInput)
            .with_message(format!("invalid json: {err}"))
            .with_hint("Check the input for syntax errors or trailing data.")
    };
    if err.line() > 0 {
        out = out.with_line(err.line() as u64);
    }
    out.with_source(err)
}

fn from_serde(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(value) => Value::Bool(value),
        serde_json::Value::Number(number) => {
            Value::Number(Number::from_text_unchecked(number.to_string()))
        }
        serde_json::Value::String(text) => Value::String(text),
        serde_json::Value::Array(items) => {
            Value::Sequence(items.into_iter().map(from_serde).collect())
        }
        serde_json::Value::Object(object) => {
            let mut map = Mapping::with_capacity(object.len());
            for (key, value) in object {
                map.push_unique(key, from_serde(value));
            }
            Value::Mapping(map)
        }
    }
}
