//! Purpose: Centralize file-format selection for import and dump paths.
//! Exports: `Format`, `SUPPORTED_EXTENSIONS`.
//! Role: Shared policy so importer and dumper agree on suffix handling.
//! Invariants: Selection is a pure string check; it never touches the filesystem.
//! Invariants: Suffix matching is ASCII case-insensitive.

use std::path::Path;

use crate::core::error::{Error, ErrorKind};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Format {
    Json,
    Csv,
}

const SUFFIXES: &[(&str, Format)] = &[(".json", Format::Json), (".csv", Format::Csv)];

pub const SUPPORTED_EXTENSIONS: &[&str] = &[".json", ".csv"];

impl Format {
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let lowered = path.to_string_lossy().to_ascii_lowercase();
        SUFFIXES
            .iter()
            .find(|(suffix, _)| lowered.ends_with(suffix))
            .map(|(_, format)| *format)
            .ok_or_else(|| unsupported_format_error(path))
    }

    pub fn label(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Csv => "csv",
        }
    }
}

fn unsupported_format_error(path: &Path) -> Error {
    Error::new(ErrorKind::UnsupportedFormat)
        .with_message(format!(
            "only {} files are supported",
            SUPPORTED_EXTENSIONS.join(" or ")
        ))
        .with_path(path)
        .with_hint("Rename the file with a .json or .csv extension.")
}
