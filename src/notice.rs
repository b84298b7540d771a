//! Purpose: Define a stable, structured schema for non-fatal stderr notices.
//! Exports: `Notice`, `notice_json`, `dump_notice`.
//! Role: Shared contract for informational outcomes such as a completed dump.
//! Invariants: Notices are non-fatal and never alter stdout payloads.
//! Invariants: JSON schema is stable once published; fields are additive-only.
use serde_json::{Map, Value, json};

use crate::query::DumpReceipt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: String,
    pub time: String,
    pub cmd: String,
    pub message: String,
    pub details: Map<String, Value>,
}

pub fn notice_json(notice: &Notice) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(notice.kind));
    inner.insert("time".to_string(), json!(notice.time));
    inner.insert("cmd".to_string(), json!(notice.cmd));
    inner.insert("message".to_string(), json!(notice.message));
    inner.insert("details".to_string(), Value::Object(notice.details.clone()));

    let mut outer = Map::new();
    outer.insert("notice".to_string(), Value::Object(inner));
    Value::Object(outer)
}

pub fn dump_notice(receipt: &DumpReceipt, cmd: &str, time: String) -> Notice {
    let mut details = Map::new();
    details.insert(
        "path".to_string(),
        json!(receipt.path.display().to_string()),
    );
    details.insert("bytes".to_string(), json!(receipt.bytes));
    Notice {
        kind: "dump".to_string(),
        time,
        cmd: cmd.to_string(),
        message: receipt.to_string(),
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::{dump_notice, notice_json};
    use crate::query::DumpReceipt;
    use std::path::PathBuf;

    #[test]
    fn dump_notice_has_required_fields() {
        let receipt = DumpReceipt {
            path: PathBuf::from("out.csv"),
            bytes: 42,
        };
        let notice = dump_notice(&receipt, "run", "2026-02-01T00:00:00Z".to_string());

        let value = notice_json(&notice);
        let obj = value
            .get("notice")
            .and_then(|v| v.as_object())
            .expect("notice object");

        assert_eq!(obj.get("kind").and_then(|v| v.as_str()), Some("dump"));
        assert_eq!(
            obj.get("time").and_then(|v| v.as_str()),
            Some("2026-02-01T00:00:00Z")
        );
        assert_eq!(obj.get("cmd").and_then(|v| v.as_str()), Some("run"));
        assert_eq!(
            obj.get("message").and_then(|v| v.as_str()),
            Some("wrote 42 bytes to out.csv")
        );
        let details = obj.get("details").and_then(|v| v.as_object()).expect("details");
        assert_eq!(details.get("bytes").and_then(|v| v.as_u64()), Some(42));
        assert_eq!(details.get("path").and_then(|v| v.as_str()), Some("out.csv"));
    }
}
