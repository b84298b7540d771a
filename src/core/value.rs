//! Purpose: Generic value tree shared by the codecs, the importer, and the store seam.
//! Exports: `Value`, `Number`, `Mapping`.
//! Role: Format-neutral model every request result and import payload passes through.
//! Invariants: Numbers keep their source text; equality compares that text.
//! Invariants: Mapping keys are unique and iterate in insertion order.

use std::fmt;
use std::sync::OnceLock;

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(number) => Some(number),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up `key` when this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|map| map.get(key))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Number(Number::from(value))
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Sequence(value)
    }
}

impl From<Mapping> for Value {
    fn from(value: Mapping) -> Self {
        Value::Mapping(value)
    }
}

/// A JSON number held as its source text.
///
/// The binary value is parsed on first use and cached; the text is what gets
/// encoded and compared, so `3.0` and `3` are different numbers here.
#[derive(Clone, Debug)]
pub struct Number {
    text: String,
    parsed: OnceLock<Option<f64>>,
}

impl Number {
    /// Validates `text` against the JSON number grammar.
    pub fn from_text(text: impl Into<String>) -> Result<Self, Error> {
        let text = text.into();
        if !is_json_number(&text) {
            return Err(Error::new(ErrorKind::MalformedInput)
                .with_message(format!("invalid number literal `{text}`")));
        }
        Ok(Self::from_text_unchecked(text))
    }

    pub(crate) fn from_text_unchecked(text: String) -> Self {
        Self {
            text,
            parsed: OnceLock::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_f64(&self) -> Option<f64> {
        *self
            .parsed
            .get_or_init(|| self.text.parse::<f64>().ok().filter(|value| value.is_finite()))
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.text.parse().ok()
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.text.parse().ok()
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Number {}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Self::from_text_unchecked(value.to_string())
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        Self::from_text_unchecked(value.to_string())
    }
}

// -?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?
fn is_json_number(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut idx = 0;
    if bytes.first() == Some(&b'-') {
        idx += 1;
    }
    match bytes.get(idx) {
        Some(b'0') => idx += 1,
        Some(b'1'..=b'9') => {
            while matches!(bytes.get(idx), Some(b'0'..=b'9')) {
                idx += 1;
            }
        }
        _ => return false,
    }
    if bytes.get(idx) == Some(&b'.') {
        idx += 1;
        let start = idx;
        while matches!(bytes.get(idx), Some(b'0'..=b'9')) {
            idx += 1;
        }
        if idx == start {
            return false;
        }
    }
    if matches!(bytes.get(idx), Some(b'e' | b'E')) {
        idx += 1;
        if matches!(bytes.get(idx), Some(b'+' | b'-')) {
            idx += 1;
        }
        let start = idx;
        while matches!(bytes.get(idx), Some(b'0'..=b'9')) {
            idx += 1;
        }
        if idx == start {
            return false;
        }
    }
    idx == bytes.len()
}

/// Insertion-ordered string-keyed map with unique keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mapping {
    entries: Vec<(String, Value)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Inserts `value` under `key`. An existing key keeps its position and
    /// has its value replaced; the previous value is returned.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    // Caller guarantees `key` is not present yet.
    pub(crate) fn push_unique(&mut self, key: String, value: Value) {
        debug_assert!(!self.contains_key(&key));
        self.entries.push((key, value));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl FromIterator<(String, Value)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut map = Mapping::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for Mapping {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{Mapping, Number, Value};
    use crate::core::error::ErrorKind;

    #[test]
    fn number_keeps_literal_text() {
        let number = Number::from_text("3.0").expect("number");
        assert_eq!(number.as_str(), "3.0");
        assert_eq!(number.as_f64(), Some(3.0));
        assert_ne!(number, Number::from_text("3").expect("number"));
    }

    #[test]
    fn number_parses_lazily_past_f64_precision() {
        let number = Number::from_text("12345678901234567890.123456789").expect("number");
        assert_eq!(number.as_str(), "12345678901234567890.123456789");
        assert!(number.as_f64().is_some());
        assert_eq!(number.as_i64(), None);
    }

    #[test]
    fn number_rejects_non_json_literals() {
        for text in ["", "-", "01", "1.", ".5", "1e", "+1", "NaN", "1 "] {
            let err = Number::from_text(text).expect_err(text);
            assert_eq!(err.kind(), ErrorKind::MalformedInput);
        }
        for text in ["0", "-0", "1e10", "2.5E-3", "-12.75"] {
            assert!(Number::from_text(text).is_ok(), "{text}");
        }
    }

    #[test]
    fn mapping_insert_replaces_in_place() {
        let mut map = Mapping::new();
        map.insert("a", Value::from(1i64));
        map.insert("b", Value::from(2i64));
        let previous = map.insert("a", Value::from("x"));

        assert_eq!(previous, Some(Value::from(1i64)));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(map.get("a"), Some(&Value::from("x")));
    }

    #[test]
    fn structural_equality_respects_order_and_type() {
        let left: Mapping = [
            ("a".to_string(), Value::from("1")),
            ("b".to_string(), Value::Null),
        ]
        .into_iter()
        .collect();
        let right: Mapping = [
            ("a".to_string(), Value::from(1i64)),
            ("b".to_string(), Value::Null),
        ]
        .into_iter()
        .collect();
        assert_ne!(Value::from(left.clone()), Value::from(right));
        assert_eq!(Value::from(left.clone()), Value::from(left));
    }
}
