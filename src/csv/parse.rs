//! Purpose: RFC 4180 style CSV reader producing a column mapping of strings.
//! Exports: `decode_csv`.
//! Role: Decoder behind CSV imports.
//! Invariants: Every data record has exactly the header's field count.
//! Notes: Quoted fields may span lines; blank lines between records are skipped.

use std::iter::Peekable;
use std::str::Chars;

use super::{BOM, DELIMITER, QUOTE};
use crate::core::error::{Error, ErrorKind};
use crate::core::value::{Mapping, Value};

struct Record {
    line: u64,
    fields: Vec<String>,
}

struct RecordReader<'a> {
    chars: Peekable<Chars<'a>>,
    line: u64,
}

impl<'a> RecordReader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
        }
    }

    fn next_record(&mut self) -> Result<Option<Record>, Error> {
        // Blank lines carry no record.
        loop {
            match self.chars.peek() {
                None => return Ok(None),
                Some('\n') => {
                    self.chars.next();
                    self.line += 1;
                }
                Some('\r') => {
                    self.chars.next();
                    self.consume_lf();
                    self.line += 1;
                }
                Some(_) => break,
            }
        }

        let line = self.line;
        let mut fields = Vec::new();
        loop {
            let field = if self.chars.peek() == Some(&QUOTE) {
                self.quoted_field(line)?
            } else {
                self.plain_field()?
            };
            fields.push(field);

            match self.chars.next() {
                Some(DELIMITER) => {}
                Some('\r') => {
                    self.consume_lf();
                    self.line += 1;
                    break;
                }
                Some(_) => {
                    self.line += 1;
                    break;
                }
                None => break,
            }
        }

        Ok(Some(Record { line, fields }))
    }

    fn plain_field(&mut self) -> Result<String, Error> {
        let mut field = String::new();
        while let Some(&c) = self.chars.peek() {
            match c {
                DELIMITER | '\n' | '\r' => break,
                QUOTE => {
                    return Err(malformed_csv_error(
                        "bare quote in unquoted field",
                        self.line,
                    ));
                }
                _ => {
                    field.push(c);
                    self.chars.next();
                }
            }
        }
        Ok(field)
    }

    fn quoted_field(&mut self, record_line: u64) -> Result<String, Error> {
        self.chars.next();
        let mut field = String::new();
        loop {
            match self.chars.next() {
                Some(QUOTE) => {
                    if self.chars.peek() == Some(&QUOTE) {
                        self.chars.next();
                        field.push(QUOTE);
                    } else {
                        break;
                    }
                }
                Some('\n') => {
                    self.line += 1;
                    field.push('\n');
                }
                Some(c) => field.push(c),
                None => {
                    return Err(malformed_csv_error("unterminated quoted field", record_line));
                }
            }
        }

        match self.chars.peek() {
            None | Some(&DELIMITER) | Some('\n') | Some('\r') => Ok(field),
            Some(_) => Err(malformed_csv_error(
                "unexpected character after closing quote",
                self.line,
            )),
        }
    }

    fn consume_lf(&mut self) {
        if self.chars.peek() == Some(&'\n') {
            self.chars.next();
        }
    }
}

fn malformed_csv_error(message: &str, line: u64) -> Error {
    Error::new(ErrorKind::MalformedInput)
        .with_message(format!("invalid csv: {message}"))
        .with_line(line)
}

pub fn decode_csv(bytes: &[u8]) -> Result<Value, Error> {
    let text = std::str::from_utf8(bytes).map_err(|err| {
        Error::new(ErrorKind::MalformedInput)
            .with_message("invalid csv: input is not valid utf-8")
            .with_source(err)
    })?;
    let text = text.strip_prefix(BOM).unwrap_or(text);

    let mut reader = RecordReader::new(text);
    let header = reader.next_record()?.ok_or_else(|| {
        Error::new(ErrorKind::EmptyInput)
            .with_message("csv input has no header row")
            .with_hint("The first line of a CSV file must name its columns.")
    })?;

    let width = header.fields.len();
    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); width];
    while let Some(record) = reader.next_record()? {
        if record.fields.len() != width {
            return Err(Error::new(ErrorKind::RowShapeMismatch)
                .with_message(format!(
                    "expected {width} fields (header), found {}",
                    record.fields.len()
                ))
                .with_line(record.line));
        }
        for (column, cell) in columns.iter_mut().zip(record.fields) {
            column.push(Value::String(cell));
        }
    }

    // Duplicate header names: first position, last column's cells.
    let mut map = Mapping::with_capacity(width);
    for (name, cells) in header.fields.into_iter().zip(columns) {
        map.insert(name, Value::Sequence(cells));
    }
    Ok(Value::Mapping(map))
}
