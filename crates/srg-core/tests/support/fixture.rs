//! Fake snapd run-time tree for CLI and integration tests.
//!
//! Lays out pids cgroups, lock and inhibit directories under one temp dir and
//! writes a config.json pointing at them.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct SnapdTree {
    root: TempDir,
}

impl SnapdTree {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        for dir in ["pids", "lock", "inhibit"] {
            fs::create_dir_all(root.path().join(dir)).expect("create fixture dir");
        }
        let tree = Self { root };
        tree.write_config(20);
        tree
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn pids_dir(&self) -> PathBuf {
        self.path().join("pids")
    }

    pub fn lock_dir(&self) -> PathBuf {
        self.path().join("lock")
    }

    pub fn inhibit_dir(&self) -> PathBuf {
        self.path().join("inhibit")
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.json")
    }

    /// Point the config at this tree with the given poll interval.
    pub fn write_config(&self, poll_interval_ms: u64) {
        let config = serde_json::json!({
            "paths": {
                "pids_cgroup_dir": self.pids_dir(),
                "lock_dir": self.lock_dir(),
                "inhibit_dir": self.inhibit_dir(),
            },
            "wait": {
                "poll_interval_ms": poll_interval_ms,
                "helper_check_interval_ms": 5u64.min(poll_interval_ms),
                "helper_program": "srg-test-no-such-helper",
            }
        });
        fs::write(self.config_path(), config.to_string()).expect("write config");
    }

    /// Put processes into the pids cgroup of a security tag.
    pub fn run(&self, tag: &str, pids: &[u32]) {
        self.write_procs(tag, &pids.iter().map(|p| format!("{p}\n")).collect::<String>());
    }

    pub fn write_procs(&self, tag: &str, content: &str) {
        let dir = self.pids_dir().join(tag);
        fs::create_dir_all(&dir).expect("create cgroup dir");
        fs::write(dir.join("cgroup.procs"), content).expect("write cgroup.procs");
    }

    pub fn inhibit(&self, snap: &str, hint: &str) {
        fs::write(self.inhibit_dir().join(format!("{snap}.lock")), hint).expect("write hint");
    }

    pub fn uninhibit(&self, snap: &str) {
        fs::write(self.inhibit_dir().join(format!("{snap}.lock")), "").expect("clear hint");
    }

    /// Write the descriptor used by most tests: one command app, one
    /// service, one enduring service and one hook.
    pub fn write_snap_info(&self) -> PathBuf {
        let path = self.path().join("pkg.json");
        let info = serde_json::json!({
            "name": "pkg",
            "apps": {
                "app": {},
                "svc": { "daemon": "simple" },
                "keeper": { "daemon": "simple", "refresh-mode": "endure" }
            },
            "hooks": { "configure": {} }
        });
        fs::write(&path, info.to_string()).expect("write snap info");
        path
    }
}
