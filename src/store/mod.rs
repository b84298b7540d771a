//! Purpose: Define the store collaborator seam used by import and query dispatch.
//! Exports: `Store`, `LogStore`, `default_store_path`.
//! Role: Everything above this trait treats the store as an opaque blocking client.
//! Invariants: Timeouts are passed through in milliseconds; enforcement belongs to the store.
//! Invariants: Callers never retry; a store error is surfaced as-is.

mod jsonl;

use std::path::PathBuf;

use crate::core::error::Error;
use crate::core::value::Value;

pub use jsonl::LogStore;

pub trait Store {
    fn insert(&mut self, value: Value, timeout_ms: u16) -> Result<Value, Error>;

    fn query(&mut self, text: &str, timeout_ms: u16) -> Result<Value, Error>;
}

pub fn default_store_path() -> PathBuf {
    let home = std::env::var_os("HOME").unwrap_or_default();
    PathBuf::from(home).join(".queryfmt").join("store.jsonl")
}
