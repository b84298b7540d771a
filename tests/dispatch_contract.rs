//! Purpose: Lock the request dispatch and codec contracts end to end.
//! Exports: Integration tests only.
//! Role: Exercise import, query, render, and dump through the public library API.
//! Invariants: Store calls are observed through a recording fake; no network.
//! Invariants: Filesystem effects stay inside per-test temp directories.

use std::path::Path;

use queryfmt::csv::{decode_csv, encode_csv};
use queryfmt::json::{decode_json, encode_json};
use queryfmt::{Error, ErrorKind, Mapping, Query, Store, Value};

#[derive(Default)]
struct RecordingStore {
    inserted: Vec<(Value, u16)>,
    queried: Vec<(String, u16)>,
    reply: Option<Value>,
}

impl Store for RecordingStore {
    fn insert(&mut self, value: Value, timeout_ms: u16) -> Result<Value, Error> {
        self.inserted.push((value, timeout_ms));
        let mut receipt = Mapping::new();
        receipt.insert("inserted", Value::Bool(true));
        Ok(Value::Mapping(receipt))
    }

    fn query(&mut self, text: &str, timeout_ms: u16) -> Result<Value, Error> {
        self.queried.push((text.to_string(), timeout_ms));
        self.reply
            .clone()
            .ok_or_else(|| Error::new(ErrorKind::Store).with_message("no reply scripted"))
    }
}

fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

#[test]
fn import_json_decodes_columns_and_inserts() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_file(temp.path(), "data.json", r#"{"a":[1,2],"b":[3,4]}"#);

    let mut store = RecordingStore::default();
    let mut query = Query::new(format!("import {}", path.display()));
    query.execute(&mut store, 1500);

    assert!(query.error().is_none(), "{:?}", query.error());
    assert_eq!(store.inserted.len(), 1);
    let (inserted, timeout_ms) = &store.inserted[0];
    assert_eq!(*timeout_ms, 1500);
    let map = inserted.as_mapping().expect("mapping");
    assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    for column in map.values() {
        assert_eq!(column.as_sequence().expect("sequence").len(), 2);
    }
    assert_eq!(query.to_json().expect("json"), r#"{"inserted":true}"#);
}

#[test]
fn import_csv_inserts_string_columns() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_file(temp.path(), "People.CSV", "name,age\nada,36\n");

    let mut store = RecordingStore::default();
    let mut query = Query::new(format!("import   {}  ", path.display()));
    query.execute(&mut store, 10);

    assert!(query.result().is_some());
    let (inserted, _) = &store.inserted[0];
    assert_eq!(
        inserted.get("age"),
        Some(&Value::Sequence(vec![Value::from("36")]))
    );
}

#[test]
fn import_unknown_extension_never_reaches_filesystem_or_store() {
    let mut store = RecordingStore::default();
    let mut query = Query::new("import data.xyz");
    query.execute(&mut store, 10);

    let err = query.error().expect("error");
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    assert!(store.inserted.is_empty());
    assert!(store.queried.is_empty());
}

#[test]
fn import_missing_file_is_io_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut store = RecordingStore::default();
    let mut query = Query::new(format!("import {}", temp.path().join("gone.json").display()));
    query.execute(&mut store, 10);

    assert_eq!(query.error().map(Error::kind), Some(ErrorKind::Io));
    assert!(store.inserted.is_empty());
}

#[test]
fn import_malformed_json_is_decode_error_with_path() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_file(temp.path(), "bad.json", r#"{"a":[1,2]} trailing"#);

    let mut store = RecordingStore::default();
    let mut query = Query::new(format!("import {}", path.display()));
    query.execute(&mut store, 10);

    let err = query.error().expect("error");
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert_eq!(err.root_kind(), ErrorKind::MalformedInput);
    assert_eq!(err.path(), Some(path.as_path()));
    assert!(store.inserted.is_empty());
}

#[test]
fn store_errors_pass_through_unchanged() {
    let mut store = RecordingStore::default();
    let mut query = Query::new("select everything");
    query.execute(&mut store, 42);

    assert_eq!(store.queried, vec![("select everything".to_string(), 42)]);
    assert_eq!(query.error().map(Error::kind), Some(ErrorKind::Store));
    assert_eq!(query.to_json().expect_err("empty").kind(), ErrorKind::EmptyResult);
    assert_eq!(query.to_csv().expect_err("empty").kind(), ErrorKind::EmptyResult);
}

#[test]
fn dump_csv_writes_header_and_one_line_per_row() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut store = RecordingStore {
        reply: Some(
            decode_json(br#"{"city":["Oslo","Lima","Pune"],"temp":[-3.5,18.0,31]}"#)
                .expect("decode"),
        ),
        ..RecordingStore::default()
    };
    let mut query = Query::new("weather");
    query.execute(&mut store, 10);

    let path = temp.path().join("out.csv");
    let receipt = query.dump_to_file(&path).expect("dump");
    let text = std::fs::read_to_string(&path).expect("read");
    assert_eq!(receipt.bytes, text.len() as u64);

    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(lines[0], "city,temp");
    assert_eq!(lines.len() - 1, 3);
    assert_eq!(lines[2], "Lima,18.0");
}

#[test]
fn dump_json_preserves_number_text() {
    let temp = tempfile::tempdir().expect("tempdir");
    let source = r#"{"total":100.00,"ratio":1e-7,"items":[{"id":1,"qty":3.0}]}"#;
    let mut store = RecordingStore {
        reply: Some(decode_json(source.as_bytes()).expect("decode")),
        ..RecordingStore::default()
    };
    let mut query = Query::new("totals");
    query.execute(&mut store, 10);

    let path = temp.path().join("OUT.JSON");
    query.dump_to_file(&path).expect("dump");
    assert_eq!(std::fs::read_to_string(&path).expect("read"), source);
}

#[test]
fn unequal_columns_are_never_padded() {
    let mut store = RecordingStore {
        reply: Some(decode_json(br#"{"a":["1","2"],"b":["3"]}"#).expect("decode")),
        ..RecordingStore::default()
    };
    let mut query = Query::new("ragged");
    query.execute(&mut store, 10);

    assert_eq!(query.to_csv().expect_err("ragged").kind(), ErrorKind::NotTabular);
}

#[test]
fn csv_round_trip_holds_for_string_tables() {
    let source = "id,comment\n1,\"hello, world\"\n2,\"she said \"\"no\"\"\"\n3,\n";
    let value = decode_csv(source.as_bytes()).expect("decode");
    let encoded = encode_csv(&value).expect("encode");
    assert_eq!(encoded, source);
    assert_eq!(decode_csv(encoded.as_bytes()).expect("decode"), value);
}

#[test]
fn json_round_trip_is_structural() {
    let source = br#"[{"k":"v","n":-0.0,"list":[],"map":{}},null,"text",false,12e3]"#;
    let value = decode_json(source).expect("decode");
    let encoded = encode_json(&value).expect("encode");
    assert_eq!(encoded.as_bytes(), source.as_slice());
    assert_eq!(decode_json(encoded.as_bytes()).expect("decode"), value);
}
