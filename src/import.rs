//! Purpose: Load a JSON or CSV file into a `Value` and hand it to the store.
//! Exports: `import_from_file`, `read_value_file`.
//! Role: File importer behind the `import <path>` request form.
//! Invariants: Format is chosen from the path suffix before any filesystem access.
//! Invariants: Read and decode failures keep the path and the underlying cause.
//! Invariants: The store's insert outcome is returned unchanged; no retries.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::core::error::{Error, ErrorKind};
use crate::core::format::Format;
use crate::core::value::Value;
use crate::csv::decode_csv;
use crate::json::decode_json;
use crate::store::Store;

pub fn import_from_file<S>(store: &mut S, path: &Path, timeout_ms: u16) -> Result<Value, Error>
where
    S: Store + ?Sized,
{
    let value = read_value_file(path)?;
    debug!(path = %path.display(), timeout_ms, "forwarding import to store");
    store.insert(value, timeout_ms)
}

/// Reads and decodes `path` without contacting the store.
pub fn read_value_file(path: &Path) -> Result<Value, Error> {
    let format = Format::from_path(path)?;
    let bytes = fs::read(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read import file")
            .with_path(path)
            .with_source(err)
    })?;
    debug!(
        path = %path.display(),
        format = format.label(),
        bytes = bytes.len(),
        "read import file"
    );

    let decoded = match format {
        Format::Json => decode_json(&bytes),
        Format::Csv => decode_csv(&bytes),
    };
    decoded.map_err(|err| {
        Error::new(ErrorKind::Decode)
            .with_message(format!("failed to decode {} file", format.label()))
            .with_path(path)
            .with_source(err)
    })
}
