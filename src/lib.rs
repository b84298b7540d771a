//! Purpose: Library crate behind the `queryfmt` CLI and its tests.
//! Exports: value model and errors (`core`), codecs (`json`, `csv`), the store seam
//! (`store`), the file importer (`import`), query dispatch (`query`), and `notice`.
//! Role: Request classification plus lossless JSON/CSV rendering in front of a store client.
//! Invariants: Library code never installs a tracing subscriber; the binary does.
//! Invariants: Components fail fast and return errors to their caller; nothing retries.
pub mod core;
pub mod csv;
pub mod import;
pub mod json;
pub mod notice;
pub mod query;
pub mod store;

pub use crate::core::error::{Error, ErrorKind, to_exit_code};
pub use crate::core::format::Format;
pub use crate::core::value::{Mapping, Number, Value};
pub use crate::query::{DumpReceipt, Query, Request};
pub use crate::store::{LogStore, Store};
