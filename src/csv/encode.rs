//! Purpose: Column-oriented CSV writer: header from mapping keys, rows in lock-step.
//! Exports: `encode_csv`.
//! Role: Renders tabular results for `to_csv` and CSV dumps.
//! Invariants: Non-tabular input is rejected with `NotTabular`, never padded.
//! Notes: Fields are quoted only when reading them back would otherwise change them.

use std::borrow::Cow;

use super::{BOM, DELIMITER, QUOTE};
use crate::core::error::{Error, ErrorKind};
use crate::core::value::Value;

pub fn encode_csv(value: &Value) -> Result<String, Error> {
    let map = value.as_mapping().ok_or_else(|| {
        not_tabular_error(format!(
            "expected a mapping of columns, found a {}",
            value.kind_name()
        ))
    })?;
    if map.is_empty() {
        return Err(not_tabular_error("mapping has no columns".to_string()));
    }

    let mut columns: Vec<(&str, &[Value])> = Vec::with_capacity(map.len());
    for (key, column) in map.iter() {
        let cells = column.as_sequence().ok_or_else(|| {
            not_tabular_error(format!(
                "column `{key}` is a {}, expected a sequence",
                column.kind_name()
            ))
        })?;
        if let Some((first_key, first_cells)) = columns.first() {
            if first_cells.len() != cells.len() {
                return Err(not_tabular_error(format!(
                    "column `{key}` has {} values but column `{first_key}` has {}",
                    cells.len(),
                    first_cells.len()
                )));
            }
        }
        columns.push((key, cells));
    }
    let row_count = columns.first().map(|(_, cells)| cells.len()).unwrap_or(0);

    let mut out = String::new();
    let header = columns
        .iter()
        .map(|(key, _)| Cow::Borrowed(*key))
        .collect::<Vec<_>>();
    write_record(&header, &mut out);

    let mut record = Vec::with_capacity(columns.len());
    for row in 0..row_count {
        record.clear();
        for (key, cells) in &columns {
            let cell = &cells[row];
            let text = cell_text(cell).ok_or_else(|| {
                not_tabular_error(format!(
                    "column `{key}` row {row} holds a {}; csv cells must be scalar",
                    cell.kind_name()
                ))
            })?;
            record.push(text);
        }
        write_record(&record, &mut out);
    }
    Ok(out)
}

fn cell_text(cell: &Value) -> Option<Cow<'_, str>> {
    match cell {
        Value::Null => Some(Cow::Borrowed("")),
        Value::Bool(value) => Some(Cow::Borrowed(if *value { "true" } else { "false" })),
        Value::Number(number) => Some(Cow::Borrowed(number.as_str())),
        Value::String(text) => Some(Cow::Borrowed(text.as_str())),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn write_record(fields: &[Cow<'_, str>], out: &mut String) {
    // A lone empty field would otherwise read back as a blank line.
    if let [only] = fields {
        if only.is_empty() {
            out.push_str("\"\"\n");
            return;
        }
    }
    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            out.push(DELIMITER);
        }
        write_field(field, out);
    }
    out.push('\n');
}

fn write_field(field: &str, out: &mut String) {
    // A leading BOM outside quotes would be stripped by the reader.
    let needs_quotes = field.starts_with(BOM)
        || field
            .chars()
            .any(|c| c == DELIMITER || c == QUOTE || c == '\n' || c == '\r');
    if !needs_quotes {
        out.push_str(field);
        return;
    }
    out.push(QUOTE);
    for c in field.chars() {
        if c == QUOTE {
            out.push(QUOTE);
        }
        out.push(c);
    }
    out.push(QUOTE);
}

fn not_tabular_error(message: String) -> Error {
    Error::new(ErrorKind::NotTabular)
        .with_message(message)
        .with_hint("CSV output needs a mapping of column names to equal-length lists of scalars.")
}
