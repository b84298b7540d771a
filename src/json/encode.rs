//! Purpose: Compact, deterministic JSON writer over the generic value tree.
//! Exports: `encode_json`.
//! Invariants: Numbers are written as their exact text; keys follow insertion order.

use crate::core::error::{Error, ErrorKind};
use crate::core::value::Value;

pub fn encode_json(value: &Value) -> Result<String, Error> {
    let mut out = String::new();
    write_value(value, &mut out)?;
    Ok(out)
}

fn write_value(value: &Value, out: &mut String) -> Result<(), Error> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(value) => out.push_str(if *value { "true" } else { "false" }),
        Value::Number(number) => out.push_str(number.as_str()),
        Value::String(text) => write_json_string(text, out)?,
        Value::Sequence(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_value(item, out)?;
            }
            out.push(']');
        }
        Value::Mapping(map) => {
            out.push('{');
            for (idx, (key, item)) in map.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_json_string(key, out)?;
                out.push(':');
                write_value(item, out)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

fn write_json_string(text: &str, out: &mut String) -> Result<(), Error> {
    let encoded = serde_json::to_string(text).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("json string encode failed")
            .with_source(err)
    })?;
    out.push_str(&encoded);
    Ok(())
}
