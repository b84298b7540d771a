// CLI integration tests for run/shell flows against a temp store file.
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use serde_json::Value;

fn cmd(store: &Path) -> Command {
    let exe = env!("CARGO_BIN_EXE_queryfmt");
    let mut command = Command::new(exe);
    command.args(["--store", store.to_str().unwrap(), "--color", "never"]);
    command
}

fn parse_json_line(output: &[u8]) -> Value {
    let text = String::from_utf8_lossy(output);
    let line = text.lines().next().expect("json line");
    serde_json::from_str(line).expect("valid json")
}

#[test]
fn import_then_query_then_dump_flow() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = temp.path().join("store.jsonl");
    let input = temp.path().join("people.csv");
    std::fs::write(&input, "name,score\nada,9.50\ngrace,10\n").expect("write");

    let import = cmd(&store)
        .args(["run", &format!("import {}", input.display())])
        .output()
        .expect("import");
    assert!(import.status.success(), "{}", String::from_utf8_lossy(&import.stderr));
    let receipt = parse_json_line(&import.stdout);
    assert_eq!(receipt["seq"], 1);
    assert_eq!(receipt["count"], 1);

    let out = temp.path().join("copy.csv");
    let query = cmd(&store)
        .args(["run", "--csv", "--out", out.to_str().unwrap(), "last"])
        .output()
        .expect("query");
    assert!(query.status.success(), "{}", String::from_utf8_lossy(&query.stderr));
    assert_eq!(
        String::from_utf8_lossy(&query.stdout),
        "name,score\nada,9.50\ngrace,10\n"
    );
    assert_eq!(
        std::fs::read_to_string(&out).expect("read dump"),
        "name,score\nada,9.50\ngrace,10\n"
    );

    let notice = parse_json_line(&query.stderr);
    assert_eq!(notice["notice"]["kind"], "dump");
    assert_eq!(notice["notice"]["details"]["bytes"], 29);
}

#[test]
fn unsupported_import_exit_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = temp.path().join("store.jsonl");

    let run = cmd(&store)
        .args(["run", "import", "data.xyz"])
        .output()
        .expect("run");
    assert_eq!(run.status.code().unwrap(), 3);
    let err = parse_json_line(&run.stderr);
    assert_eq!(err["error"]["kind"], "UnsupportedFormat");
}

#[test]
fn sequence_result_cannot_render_as_csv() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = temp.path().join("store.jsonl");
    let input = temp.path().join("row.json");
    std::fs::write(&input, r#"{"a":["x"]}"#).expect("write");

    let import = cmd(&store)
        .args(["run", &format!("import {}", input.display())])
        .output()
        .expect("import");
    assert!(import.status.success());

    let run = cmd(&store).args(["run", "--csv", "all"]).output().expect("run");
    assert_eq!(run.status.code().unwrap(), 9);
    assert_eq!(parse_json_line(&run.stderr)["error"]["kind"], "NotConvertible");
}

#[test]
fn usage_exit_code_for_unknown_selector() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = temp.path().join("store.jsonl");

    let run = cmd(&store).args(["run", "SELECT 1"]).output().expect("run");
    assert_eq!(run.status.code().unwrap(), 2);
}

#[test]
fn shell_session_keeps_going_after_errors() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = temp.path().join("store.jsonl");
    let input = temp.path().join("data.json");
    let dump = temp.path().join("last.json");
    std::fs::write(&input, r#"{"n":[1.0,2.50]}"#).expect("write");

    let mut child = cmd(&store)
        .arg("shell")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn");
    {
        let stdin = child.stdin.as_mut().expect("stdin");
        writeln!(stdin, "dump {}", dump.display()).expect("write");
        writeln!(stdin, "import {}", input.display()).expect("write");
        writeln!(stdin, "last").expect("write");
        writeln!(stdin, "dump {}", dump.display()).expect("write");
        writeln!(stdin, "quit").expect("write");
    }
    let output = child.wait_with_output().expect("wait");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines = stdout.lines().collect::<Vec<_>>();
    assert_eq!(lines, vec![r#"{"seq":1,"count":1}"#, r#"{"n":[1.0,2.50]}"#]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    let events = stderr
        .lines()
        .map(|line| serde_json::from_str::<Value>(line).expect("json"))
        .collect::<Vec<_>>();
    assert_eq!(events[0]["error"]["kind"], "EmptyResult");
    assert_eq!(events[1]["notice"]["kind"], "dump");

    assert_eq!(
        std::fs::read_to_string(&dump).expect("read"),
        r#"{"n":[1.0,2.50]}"#
    );
}
