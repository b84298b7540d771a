//! Purpose: Reference store client backed by an append-only JSON Lines file.
//! Exports: `LogStore`.
//! Role: Lets the CLI run import/query end to end without a remote service.
//! Invariants: One record per line, written with the JSON codec so number text survives.
//! Invariants: Records are 1-based by seq and never rewritten.
//! Notes: The selector vocabulary (`last`, `all`, `count`, `<seq>`) is not a query language.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::debug;

use super::Store;
use crate::core::error::{Error, ErrorKind};
use crate::core::value::{Mapping, Value};
use crate::json::{decode_json, encode_json};

#[derive(Debug, Default)]
pub struct LogStore {
    path: Option<PathBuf>,
    records: Vec<Value>,
}

impl LogStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads every record from `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(io_error(err, "failed to read store", &path)),
        };

        let mut records = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record = decode_json(line.as_bytes()).map_err(|err| {
                Error::new(ErrorKind::Decode)
                    .with_message("corrupt store record")
                    .with_path(&path)
                    .with_line(idx as u64 + 1)
                    .with_source(err)
            })?;
            records.push(record);
        }
        debug!(path = %path.display(), records = records.len(), "opened store");

        Ok(Self {
            path: Some(path),
            records,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn persist(&self, line: &str) -> Result<(), Error> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|err| io_error(err, "failed to create store directory", parent))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| io_error(err, "failed to open store", path))?;
        file.write_all(line.as_bytes())
            .and_then(|()| file.write_all(b"\n"))
            .map_err(|err| io_error(err, "failed to append to store", path))
    }

    fn select(&self, selector: &str) -> Result<Value, Error> {
        match selector {
            "last" => self.records.last().cloned().ok_or_else(|| {
                Error::new(ErrorKind::Store).with_message("store is empty")
            }),
            "all" => Ok(Value::Sequence(self.records.clone())),
            "count" => Ok(Value::from(self.records.len() as u64)),
            _ => {
                let seq = selector.parse::<u64>().map_err(|_| {
                    Error::new(ErrorKind::Usage)
                        .with_message(format!("unknown query `{selector}`"))
                        .with_hint("Use `last`, `all`, `count`, or a record seq.")
                })?;
                seq.checked_sub(1)
                    .and_then(|idx| usize::try_from(idx).ok())
                    .and_then(|idx| self.records.get(idx))
                    .cloned()
                    .ok_or_else(|| {
                        Error::new(ErrorKind::Store)
                            .with_message(format!("no record with seq {seq}"))
                    })
            }
        }
    }

    // The deadline is checked before anything is written.
    fn append(&mut self, value: Value, deadline: &Deadline) -> Result<Value, Error> {
        let line = encode_json(&value)?;
        deadline.check("insert")?;

        self.persist(&line)?;
        self.records.push(value);
        let seq = self.records.len() as u64;
        debug!(seq, bytes = line.len(), "appended record");

        let mut receipt = Mapping::new();
        receipt.insert("seq", Value::from(seq));
        receipt.insert("count", Value::from(self.records.len() as u64));
        Ok(Value::Mapping(receipt))
    }
}

impl Store for LogStore {
    fn insert(&mut self, value: Value, timeout_ms: u16) -> Result<Value, Error> {
        self.append(value, &Deadline::start(timeout_ms))
    }

    fn query(&mut self, text: &str, timeout_ms: u16) -> Result<Value, Error> {
        let deadline = Deadline::start(timeout_ms);
        let result = self.select(text.trim())?;
        deadline.check("query")?;
        Ok(result)
    }
}

// Zero means no deadline.
struct Deadline {
    started: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    fn start(timeout_ms: u16) -> Self {
        Self {
            started: Instant::now(),
            budget: (timeout_ms > 0).then(|| Duration::from_millis(u64::from(timeout_ms))),
        }
    }

    fn check(&self, op: &str) -> Result<(), Error> {
        match self.budget {
            Some(budget) if self.started.elapsed() > budget => Err(Error::new(ErrorKind::Timeout)
                .with_message(format!(
                    "{op} exceeded deadline of {}ms",
                    budget.as_millis()
                ))),
            _ => Ok(()),
        }
    }
}

fn io_error(err: io::Error, message: &str, path: &Path) -> Error {
    Error::new(ErrorKind::Io)
        .with_message(message)
        .with_path(path)
        .with_source(err)
}
