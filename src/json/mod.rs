//! Purpose: JSON codec boundary between text and the generic `Value` tree.
//! Exports: `decode_json`, `encode_json`.
//! Role: Single seam for JSON handling so import, dump, and the store log agree.
//! Invariants: Number literals keep their source text through decode and encode.
//! Invariants: Object key order follows mapping insertion order.

mod encode;
mod parse;

pub use encode::encode_json;
pub use parse::decode_json;
