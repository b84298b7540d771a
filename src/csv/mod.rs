//! Purpose: CSV codec between flat CSV text and tabular `Value` mappings.
//! Exports: `decode_csv`, `encode_csv`, `DELIMITER`.
//! Role: Column-oriented view: a mapping of column name to equal-length sequences.
//! Invariants: Decode never infers types; every cell comes back as a string.
//! Invariants: Encode rejects non-tabular values instead of padding or truncating.
//! Notes: Encoding numbers, bools, or nulls is lossy; they decode as strings.

mod encode;
mod parse;

pub use encode::encode_csv;
pub use parse::decode_csv;

pub const DELIMITER: char = ',';
const QUOTE: char = '"';
const BOM: char = '\u{feff}';
