//! Purpose: Model one dispatched request and render its outcome.
//! Exports: `Request`, `Query`, `DumpReceipt`, `IMPORT_PREFIX`.
//! Role: Command dispatcher plus the query unit that owns a request's result or error.
//! Invariants: A query resolves at most once; later `execute` calls leave it untouched.
//! Invariants: After execution exactly one of result/error is present.
//! Invariants: A successful dump is reported as a `DumpReceipt`, never as an error.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::error::{Error, ErrorKind};
use crate::core::format::Format;
use crate::core::value::Value;
use crate::csv::encode_csv;
use crate::import::import_from_file;
use crate::json::encode_json;
use crate::store::Store;

pub const IMPORT_PREFIX: &str = "import ";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Request<'a> {
    Import(PathBuf),
    Query(&'a str),
}

impl<'a> Request<'a> {
    /// `import <path>` (case-sensitive, single space) names a file; anything
    /// else is opaque query text passed through verbatim.
    pub fn classify(text: &'a str) -> Self {
        match text.strip_prefix(IMPORT_PREFIX) {
            Some(rest) => Request::Import(PathBuf::from(rest.trim())),
            None => Request::Query(text),
        }
    }
}

#[derive(Debug)]
pub struct Query {
    request: String,
    outcome: Option<Result<Value, Error>>,
}

impl Query {
    pub fn new(request: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            outcome: None,
        }
    }

    pub fn request(&self) -> &str {
        &self.request
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn result(&self) -> Option<&Value> {
        self.outcome.as_ref().and_then(|outcome| outcome.as_ref().ok())
    }

    pub fn error(&self) -> Option<&Error> {
        self.outcome.as_ref().and_then(|outcome| outcome.as_ref().err())
    }

    /// Consumes the unit, yielding its outcome (`None` if never executed).
    pub fn into_outcome(self) -> Option<Result<Value, Error>> {
        self.outcome
    }

    pub fn execute<S>(&mut self, store: &mut S, timeout_ms: u16)
    where
        S: Store + ?Sized,
    {
        if self.is_resolved() {
            warn!(request = %self.request, "query already executed; ignoring");
            return;
        }
        let outcome = match Request::classify(&self.request) {
            Request::Import(path) => {
                debug!(path = %path.display(), timeout_ms, "dispatching import");
                import_from_file(store, &path, timeout_ms)
            }
            Request::Query(text) => {
                debug!(timeout_ms, "dispatching query");
                store.query(text, timeout_ms)
            }
        };
        if let Err(err) = &outcome {
            debug!(error = %err, "request failed");
        }
        self.outcome = Some(outcome);
    }

    pub fn to_json(&self) -> Result<String, Error> {
        let value = self.require_result("nothing to render as JSON")?;
        encode_json(value)
    }

    pub fn to_csv(&self) -> Result<String, Error> {
        let value = self.require_result("nothing to render as CSV")?;
        if value.as_mapping().is_none() {
            return Err(Error::new(ErrorKind::NotConvertible)
                .with_message(format!(
                    "cannot convert a {} result to CSV",
                    value.kind_name()
                ))
                .with_hint("Only mapping results (column name to list) can be written as CSV."));
        }
        encode_csv(value)
    }

    /// Renders the result in the format implied by `path` and writes it there.
    pub fn dump_to_file(&self, path: &Path) -> Result<DumpReceipt, Error> {
        let rendered = match Format::from_path(path)? {
            Format::Json => self.to_json()?,
            Format::Csv => self.to_csv()?,
        };
        fs::write(path, rendered.as_bytes()).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to write dump file")
                .with_path(path)
                .with_source(err)
        })?;
        let receipt = DumpReceipt {
            path: path.to_path_buf(),
            bytes: rendered.len() as u64,
        };
        debug!(path = %path.display(), bytes = receipt.bytes, "dumped result");
        Ok(receipt)
    }

    fn require_result(&self, message: &str) -> Result<&Value, Error> {
        self.result().ok_or_else(|| {
            let err = Error::new(ErrorKind::EmptyResult).with_message(message);
            if self.is_resolved() {
                err.with_hint("The last request failed; run a successful request first.")
            } else {
                err.with_hint("Run a request before rendering its result.")
            }
        })
    }
}

/// Successful dump outcome; informational, not an error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DumpReceipt {
    pub path: PathBuf,
    pub bytes: u64,
}

impl fmt::Display for DumpReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wrote {} bytes to {}", self.bytes, self.path.display())
    }
}
