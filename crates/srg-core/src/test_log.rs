//! JSONL traces for tests.
//!
//! Entries are appended to `target/test-logs/srg-core-tests-<pid>.jsonl` so a
//! failing wait or check test leaves a machine-readable timeline behind.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// File receiving this test process's entries.
pub fn log_path() -> PathBuf {
    let target = std::env::var_os("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("../../target"));
    target
        .join("test-logs")
        .join(format!("srg-core-tests-{}.jsonl", std::process::id()))
}

fn append(line: &str) -> std::io::Result<()> {
    let path = log_path();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    writeln!(file, "{line}")
}

/// Build one log entry. Caller fields that collide with built-in keys are
/// stored under `extra_<key>`.
pub fn entry(level: &str, msg: &str, file: &str, line: u32, fields: &[(&str, Value)]) -> Value {
    let mut map = Map::new();
    map.insert(
        "ts".into(),
        Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true).into(),
    );
    map.insert("level".into(), level.into());
    map.insert("msg".into(), msg.into());
    map.insert("file".into(), file.into());
    map.insert("line".into(), line.into());
    map.insert("pid".into(), std::process::id().into());
    let test = std::thread::current()
        .name()
        .unwrap_or("unnamed")
        .to_string();
    map.insert("test".into(), test.into());

    for (key, value) in fields {
        let key = if map.contains_key(*key) && *key != "test" {
            format!("extra_{key}")
        } else {
            (*key).to_string()
        };
        map.insert(key, value.clone());
    }
    Value::Object(map)
}

/// Append an entry to the test log. Failures go to stderr and never fail the test.
pub fn log_event(level: &str, msg: &str, file: &str, line: u32, fields: &[(&str, Value)]) {
    let entry = entry(level, msg, file, line, fields);
    if let Err(err) = append(&entry.to_string()) {
        eprintln!("test_log: cannot write {}: {err}", log_path().display());
    }
}

#[macro_export]
macro_rules! test_log {
    ($level:ident, $msg:expr $(, $key:ident = $val:expr )* $(,)?) => {{
        let fields = vec![
            $(
                (stringify!($key), serde_json::json!($val)),
            )*
        ];
        $crate::test_log::log_event(stringify!($level), &$msg.to_string(), file!(), line!(), &fields);
    }};
}
