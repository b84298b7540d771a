// Core modules: value model, error taxonomy, and format selection.
pub mod error;
pub mod format;
pub mod value;
